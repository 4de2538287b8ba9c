//! # Global Data - Site-Wide Colors and Variables
//!
//! Global colors (`gcid-*`) and global variables (`gvid-*`) are stored once
//! per site and referenced from block attributes, either as CSS custom
//! properties (`var(--gcid-123)`) or as `$variable({...})$` tokens. A global
//! color may itself reference another global color and adjust its hue,
//! saturation, lightness or opacity.
//!
//! Resolution follows references until it reaches a literal value. It stops
//! at `max_depth` levels or when an id repeats, returning the reference
//! where it stopped, so reference cycles in stored data always terminate.

mod color;
mod variable;

pub use color::{ColorFilters, FilterMode};

use std::collections::BTreeMap;

use divi_blocks_config::GlobalDataConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PresetError;
use crate::host::OptionsStore;
use crate::parsing::preprocess::find_tokens;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalColor {
    pub color: String,
    pub status: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalVariable {
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StoredGlobalData {
    global_colors: BTreeMap<String, GlobalColor>,
    global_variables: BTreeMap<String, GlobalVariable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalData {
    colors: BTreeMap<String, GlobalColor>,
    variables: BTreeMap<String, GlobalVariable>,
    max_depth: usize,
}

impl Default for GlobalData {
    fn default() -> Self {
        Self::new(GlobalDataConfig::default().max_depth)
    }
}

impl GlobalData {
    pub fn new(max_depth: usize) -> Self {
        Self {
            colors: BTreeMap::new(),
            variables: BTreeMap::new(),
            max_depth,
        }
    }

    /// Load colors and variables from the option named in `config`.
    pub fn from_options(
        options: &dyn OptionsStore,
        config: &GlobalDataConfig,
    ) -> Result<Self, PresetError> {
        let stored = match options.get(&config.option_key) {
            None | Some(Value::Null) => StoredGlobalData::default(),
            Some(value) => serde_json::from_value(value).map_err(|source| PresetError::Decode {
                key: config.option_key.clone(),
                source,
            })?,
        };
        Ok(Self {
            colors: stored.global_colors,
            variables: stored.global_variables,
            max_depth: config.max_depth,
        })
    }

    pub fn with_color(mut self, id: impl Into<String>, color: impl Into<String>) -> Self {
        self.colors.insert(
            id.into(),
            GlobalColor {
                color: color.into(),
                status: "active".to_string(),
                label: String::new(),
            },
        );
        self
    }

    pub fn with_variable(mut self, id: impl Into<String>, value: Value) -> Self {
        self.variables.insert(
            id.into(),
            GlobalVariable {
                value,
                ..GlobalVariable::default()
            },
        );
        self
    }

    pub fn color(&self, id: &str) -> Option<&GlobalColor> {
        self.colors.get(id)
    }

    pub fn variable(&self, id: &str) -> Option<&GlobalVariable> {
        self.variables.get(id)
    }

    /// Resolve every global reference in the string leaves of `attrs`.
    pub fn resolve_attrs(&self, attrs: &Value, mode: FilterMode) -> Value {
        match attrs {
            Value::String(text) => Value::String(self.resolve_text(text, mode)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_attrs(item, mode))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.resolve_attrs(value, mode)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_text(&self, text: &str, mode: FilterMode) -> String {
        if let Some(id) = css_var_id(text) {
            return if id.starts_with("gvid-") {
                self.resolve_variable(text)
            } else {
                self.resolve_color(text, mode)
            };
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for token in find_tokens(text) {
            let source = &text[token.range.clone()];
            let resolved = match token.variable.kind.as_str() {
                "color" => self.resolve_color(source, mode),
                "content" if token.variable.value.name.starts_with("gvid-") => {
                    self.resolve_variable(source)
                }
                _ => continue,
            };
            out.push_str(&text[last..token.range.start]);
            out.push_str(&resolved);
            last = token.range.end;
        }
        out.push_str(&text[last..]);
        out
    }
}

/// The id inside a whole-string `var(--id)`.
fn css_var_id(text: &str) -> Option<&str> {
    let id = text.trim().strip_prefix("var(--")?.strip_suffix(')')?;
    (!id.is_empty() && !id.contains(['(', ')', ','])).then_some(id)
}
