use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::utils::group_name_for;

/// Setting sections of an attribute that hold preset groups.
const GROUP_SECTIONS: [&str; 2] = ["decoration", "advanced"];

/// A module's name and attribute schema.
///
/// The schema maps each top-level attribute to its definition; groups are
/// read from `<attr>.settings.decoration.<key>` and
/// `<attr>.settings.advanced.<key>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub name: String,
    #[serde(default, alias = "attributes")]
    pub attrs: Value,
}

/// A preset group a module exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    /// Dot path of the group inside block attributes, e.g.
    /// `title.decoration.font`.
    pub group_id: String,
    /// Canonical group name, e.g. `divi/font`.
    pub group_name: String,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>, attrs: Value) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }

    pub fn groups(&self) -> Vec<GroupDefinition> {
        let Some(attributes) = self.attrs.as_object() else {
            return Vec::new();
        };

        let mut groups = Vec::new();
        for (attr_name, definition) in attributes {
            for section in GROUP_SECTIONS {
                let Some(keys) = definition
                    .get("settings")
                    .and_then(|settings| settings.get(section))
                    .and_then(Value::as_object)
                else {
                    continue;
                };
                groups.extend(keys.keys().filter_map(|key| {
                    Some(GroupDefinition {
                        group_id: format!("{attr_name}.{section}.{key}"),
                        group_name: group_name_for(key)?.to_string(),
                    })
                }));
            }
        }
        groups
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleDefinition>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: ModuleDefinition) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn with(mut self, module: ModuleDefinition) -> Self {
        self.register(module);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.get(name)
    }

    /// Groups of `module_name`; unknown modules have none.
    pub fn groups(&self, module_name: &str) -> Vec<GroupDefinition> {
        self.get(module_name)
            .map(ModuleDefinition::groups)
            .unwrap_or_default()
    }

    pub fn group(&self, module_name: &str, group_id: &str) -> Option<GroupDefinition> {
        self.groups(module_name)
            .into_iter()
            .find(|group| group.group_id == group_id)
    }

    /// Every group id of `module_name` belonging to `group_name`.
    pub fn group_ids(&self, module_name: &str, group_name: &str) -> Vec<String> {
        self.groups(module_name)
            .into_iter()
            .filter(|group| group.group_name == group_name)
            .map(|group| group.group_id)
            .collect()
    }
}
