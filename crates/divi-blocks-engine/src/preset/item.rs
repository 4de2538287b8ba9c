use std::collections::BTreeMap;

use serde_json::Value;

use super::data::{GroupPresetRef, PresetRecord};
use super::utils::{is_preset_id_as_default, selector_class_name};
use crate::attrs;

/// A module preset selected for a block.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPresetItem {
    record: PresetRecord,
    default_id: String,
    default_priority: i64,
}

impl GlobalPresetItem {
    pub fn new(record: PresetRecord, default_id: impl Into<String>, default_priority: i64) -> Self {
        Self {
            record,
            default_id: default_id.into(),
            default_priority,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn module_name(&self) -> &str {
        &self.record.module_name
    }

    pub fn priority(&self) -> i64 {
        self.record.priority.unwrap_or(self.default_priority)
    }

    pub fn attrs(&self) -> &Value {
        &self.record.attrs
    }

    pub fn render_attrs(&self) -> &Value {
        &self.record.render_attrs
    }

    pub fn style_attrs(&self) -> &Value {
        &self.record.style_attrs
    }

    /// Attributes a block receives from this preset.
    pub fn data_attrs(&self) -> Value {
        attrs::merge_all([&self.record.attrs, &self.record.render_attrs])
    }

    pub fn group_presets(&self) -> &BTreeMap<String, GroupPresetRef> {
        &self.record.group_presets
    }

    pub fn is_default(&self) -> bool {
        is_preset_id_as_default(&self.record.id, &self.default_id)
    }

    pub fn selector_class_name(&self) -> String {
        selector_class_name(
            "module",
            &self.record.module_name,
            &self.record.id,
            &self.default_id,
        )
    }

    pub fn record(&self) -> &PresetRecord {
        &self.record
    }
}
