use std::collections::HashMap;

use crate::parsing::LayoutType;

/// Per `(layout type, module name)` counters behind block order indexes.
///
/// Shared by every store instance, so two parses on one page keep numbering
/// the same module unless a layout type is reset in between.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleOrder {
    counters: HashMap<(LayoutType, String), u64>,
}

impl ModuleOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next order index for `name` and advance the counter.
    pub fn next(&mut self, name: &str, layout_type: &LayoutType) -> u64 {
        let counter = self
            .counters
            .entry((layout_type.clone(), name.to_string()))
            .or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    /// The index the next block of `name` would get.
    pub fn peek(&self, name: &str, layout_type: &LayoutType) -> u64 {
        self.counters
            .get(&(layout_type.clone(), name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn reset(&mut self, layout_type: &LayoutType) {
        self.counters.retain(|(kind, _), _| kind != layout_type);
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }
}
