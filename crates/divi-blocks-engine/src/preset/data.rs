use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PresetError;
use crate::host::OptionsStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    #[default]
    Module,
    Group,
}

/// One stored preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetRecord {
    #[serde(rename = "type")]
    pub kind: PresetKind,
    pub id: String,
    pub name: String,
    pub module_name: String,
    pub group_name: Option<String>,
    pub group_id: Option<String>,
    pub primary_attr_name: Option<String>,
    pub priority: Option<i64>,
    pub attrs: Value,
    pub render_attrs: Value,
    pub style_attrs: Value,
    /// Group presets selected by a module preset, keyed by group id.
    #[serde(deserialize_with = "map_or_empty_list")]
    pub group_presets: BTreeMap<String, GroupPresetRef>,
    pub created: Option<i64>,
    pub updated: Option<i64>,
    pub version: Option<String>,
}

/// A group preset selection, as stored on blocks and module presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupPresetRef {
    /// A single id or a stack of ids.
    pub preset_id: Value,
    pub group_name: String,
}

/// The presets of one module or group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetCollection {
    pub default: String,
    #[serde(deserialize_with = "map_or_empty_list")]
    pub items: BTreeMap<String, PresetRecord>,
}

impl PresetCollection {
    pub fn get(&self, id: &str) -> Option<&PresetRecord> {
        self.items.get(id)
    }

    /// The default preset's id, if it names an existing item.
    pub fn default_id(&self) -> Option<&str> {
        (!self.default.is_empty() && self.items.contains_key(&self.default))
            .then_some(self.default.as_str())
    }
}

/// Every stored preset: `{module: {name: ...}, group: {name: ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetsData {
    #[serde(deserialize_with = "map_or_empty_list")]
    pub module: BTreeMap<String, PresetCollection>,
    #[serde(deserialize_with = "map_or_empty_list")]
    pub group: BTreeMap<String, PresetCollection>,
}

impl PresetsData {
    /// Load presets stored under `key`. A missing option is empty data.
    pub fn from_options(options: &dyn OptionsStore, key: &str) -> Result<Self, PresetError> {
        match options.get(key) {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value).map_err(|source| PresetError::Decode {
                key: key.to_string(),
                source,
            }),
        }
    }

    pub fn module_collection(&self, module_name: &str) -> Option<&PresetCollection> {
        self.module.get(module_name)
    }

    pub fn group_collection(&self, group_name: &str) -> Option<&PresetCollection> {
        self.group.get(group_name)
    }
}

/// Empty maps are sometimes stored as `[]`.
fn map_or_empty_list<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(_) | Value::Null => Ok(BTreeMap::new()),
        value => serde_json::from_value(value).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn loads_stored_presets() {
        let options = MemoryOptions::new().with(
            "builder_global_presets_d5",
            json!({
                "module": {
                    "divi/text": {
                        "default": "t1",
                        "items": {
                            "t1": {"type": "module", "id": "t1", "name": "Base", "moduleName": "divi/text",
                                   "priority": 5, "attrs": {"a": 1}}
                        }
                    }
                },
                "group": []
            }),
        );

        let data = PresetsData::from_options(&options, "builder_global_presets_d5").unwrap();

        let texts = data.module_collection("divi/text").unwrap();
        assert_eq!(texts.default_id(), Some("t1"));
        assert_eq!(texts.get("t1").unwrap().priority, Some(5));
        assert!(data.group.is_empty());
    }

    #[test]
    fn empty_lists_decode_as_empty_maps() {
        let record: PresetRecord = serde_json::from_value(json!({
            "id": "t1",
            "groupPresets": []
        }))
        .unwrap();
        assert!(record.group_presets.is_empty());

        let record: PresetRecord = serde_json::from_value(json!({
            "id": "t2",
            "groupPresets": {"title.decoration.font": {"presetId": "f1", "groupName": "divi/font"}}
        }))
        .unwrap();
        assert_eq!(record.group_presets["title.decoration.font"].group_name, "divi/font");
    }

    #[test]
    fn missing_option_is_empty() {
        let data = PresetsData::from_options(&MemoryOptions::new(), "missing").unwrap();
        assert_eq!(data, PresetsData::default());
    }

    #[test]
    fn undecodable_option_is_an_error() {
        let options = MemoryOptions::new().with("k", json!({"module": 3}));
        assert!(matches!(
            PresetsData::from_options(&options, "k"),
            Err(PresetError::Decode { .. })
        ));
    }

    #[test]
    fn default_must_exist() {
        let collection = PresetCollection {
            default: "gone".into(),
            items: BTreeMap::new(),
        };
        assert_eq!(collection.default_id(), None);
    }
}
