//! # Global Presets - Merged Attributes for a Block
//!
//! [`GlobalPreset`] answers two questions for a block: which presets apply,
//! and what attributes result from applying them.
//!
//! Module presets come from the block's `modulePreset` stack, or the
//! module's default preset when the stack is empty. Group presets are picked
//! per group id from three layers:
//!
//! 1. the default preset of every group the module definition exposes,
//! 2. group presets carried by the selected module presets,
//! 3. the block's own `groupPreset` selections.
//!
//! Layers 2 and 3 stack (3 after 2) and replace layer 1 for their group.
//! Every stack is sorted by ascending priority, equal priorities keeping
//! stack order, so later presets win conflicting keys.
//!
//! The merged attributes are module presets, then group presets, then the
//! block's own attributes, deep-merged in that order.

use std::collections::BTreeMap;

use divi_blocks_config::PresetConfig;
use log::debug;
use serde_json::Value;

use super::attr_name_resolver::AttrNameResolver;
use super::data::{GroupPresetRef, PresetCollection, PresetsData};
use super::item::GlobalPresetItem;
use super::item_group::GlobalPresetItemGroup;
use super::module_registry::ModuleRegistry;
use super::utils::normalize_preset_stack;
use crate::attrs;
use crate::error::PresetError;
use crate::host::{Host, OptionsStore};

pub const MODULE_PRESET_ATTR: &str = "modulePreset";
pub const GROUP_PRESET_ATTR: &str = "groupPreset";

/// The group presets applied to one group of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSelection {
    pub group_id: String,
    pub group_name: String,
    pub presets: Vec<GlobalPresetItemGroup>,
}

#[derive(Debug, Default)]
pub struct GlobalPreset {
    data: PresetsData,
    registry: ModuleRegistry,
    config: PresetConfig,
    resolver: AttrNameResolver,
}

impl GlobalPreset {
    pub fn new(data: PresetsData, registry: ModuleRegistry, config: PresetConfig) -> Self {
        Self {
            data,
            registry,
            config,
            resolver: AttrNameResolver::new(),
        }
    }

    /// Load preset data from the option named in `config`.
    pub fn from_options(
        options: &dyn OptionsStore,
        registry: ModuleRegistry,
        config: PresetConfig,
    ) -> Result<Self, PresetError> {
        let data = PresetsData::from_options(options, &config.option_key)?;
        Ok(Self::new(data, registry, config))
    }

    pub fn data(&self) -> &PresetsData {
        &self.data
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Module presets applied to a block, lowest priority first.
    pub fn module_presets(&self, module_name: &str, block_attrs: &Value) -> Vec<GlobalPresetItem> {
        let Some(collection) = self.data.module_collection(module_name) else {
            return Vec::new();
        };

        let mut stack = normalize_preset_stack(block_attrs.get(MODULE_PRESET_ATTR).unwrap_or(&Value::Null));
        stack.retain(|id| collection.get(id).is_some());
        if stack.is_empty() {
            stack.extend(collection.default_id().map(str::to_string));
        }

        let mut items: Vec<_> = stack
            .iter()
            .filter_map(|id| collection.get(id))
            .map(|record| {
                GlobalPresetItem::new(
                    record.clone(),
                    collection.default.clone(),
                    self.config.default_priority,
                )
            })
            .collect();
        items.sort_by_key(GlobalPresetItem::priority);
        items
    }

    /// Group presets applied to a block, per group id.
    pub fn group_presets(&self, module_name: &str, block_attrs: &Value) -> Vec<GroupSelection> {
        let module_presets = self.module_presets(module_name, block_attrs);

        // group id -> (group name, preset ids)
        let mut defaults: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
        for group in self.registry.groups(module_name) {
            if let Some(default_id) = self
                .data
                .group_collection(&group.group_name)
                .and_then(PresetCollection::default_id)
            {
                defaults.insert(group.group_id, (group.group_name, vec![default_id.to_string()]));
            }
        }

        let mut selected: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
        let nested = module_presets.iter().flat_map(|item| item.group_presets().iter());
        let explicit = block_attrs
            .get(GROUP_PRESET_ATTR)
            .and_then(|value| serde_json::from_value::<BTreeMap<String, GroupPresetRef>>(value.clone()).ok())
            .unwrap_or_default();
        for (group_id, reference) in nested.chain(explicit.iter()) {
            let group_name = self.group_name(module_name, group_id, &reference.group_name);
            let Some(collection) = self.data.group_collection(&group_name) else {
                continue;
            };
            let mut ids = normalize_preset_stack(&reference.preset_id);
            ids.retain(|id| collection.get(id).is_some());
            if ids.is_empty() {
                continue;
            }
            let entry = selected
                .entry(group_id.clone())
                .or_insert_with(|| (group_name, Vec::new()));
            entry.1.extend(ids);
        }

        for (group_id, selection) in selected {
            defaults.insert(group_id, selection);
        }

        defaults
            .into_iter()
            .filter_map(|(group_id, (group_name, ids))| {
                let collection = self.data.group_collection(&group_name)?;
                let mut presets: Vec<_> = ids
                    .iter()
                    .filter_map(|id| collection.get(id))
                    .map(|record| {
                        GlobalPresetItemGroup::new(
                            record.clone(),
                            group_id.clone(),
                            group_name.clone(),
                            collection.default.clone(),
                            self.config.default_priority,
                        )
                    })
                    .collect();
                if presets.is_empty() {
                    return None;
                }
                presets.sort_by_key(GlobalPresetItemGroup::priority);
                Some(GroupSelection {
                    group_id,
                    group_name,
                    presets,
                })
            })
            .collect()
    }

    fn group_name(&self, module_name: &str, group_id: &str, stored: &str) -> String {
        if !stored.is_empty() {
            return stored.to_string();
        }
        self.registry
            .group(module_name, group_id)
            .map(|group| group.group_name)
            .unwrap_or_default()
    }

    /// The block's attributes with every applicable preset merged beneath.
    pub fn get_merged_attrs(
        &self,
        module_name: &str,
        block_attrs: Option<&Value>,
        host: &dyn Host,
    ) -> Result<Value, PresetError> {
        if module_name.is_empty() {
            return Err(PresetError::InvalidArgument(
                "module name is required".to_string(),
            ));
        }
        let block_attrs = match block_attrs {
            Some(value @ Value::Object(_)) => value,
            Some(_) => {
                return Err(PresetError::InvalidArgument(
                    "block attributes must be an object".to_string(),
                ));
            }
            None => {
                return Err(PresetError::InvalidArgument(
                    "block attributes are required".to_string(),
                ));
            }
        };

        let module_layer = attrs::merge_all(
            self.module_presets(module_name, block_attrs)
                .iter()
                .map(GlobalPresetItem::data_attrs)
                .collect::<Vec<_>>()
                .iter(),
        );

        let mut group_layer = Value::Object(Default::default());
        for selection in self.group_presets(module_name, block_attrs) {
            let targets = self.target_attr_names(module_name, &selection);
            for preset in &selection.presets {
                let attrs = preset.data_attrs_for(&targets, &self.resolver, host);
                group_layer = attrs::merge(&group_layer, &attrs);
            }
        }

        debug!("Merged presets for {module_name}");
        Ok(attrs::merge_all([&module_layer, &group_layer, block_attrs]))
    }

    /// The selected group first, then the module's other groups of that name.
    fn target_attr_names(&self, module_name: &str, selection: &GroupSelection) -> Vec<String> {
        let mut targets = vec![selection.group_id.clone()];
        targets.extend(
            self.registry
                .group_ids(module_name, &selection.group_name)
                .into_iter()
                .filter(|id| *id != selection.group_id),
        );
        targets
    }

    /// CSS class names for every applied preset.
    pub fn selector_class_names(&self, module_name: &str, block_attrs: &Value) -> Vec<String> {
        let mut names: Vec<_> = self
            .module_presets(module_name, block_attrs)
            .iter()
            .map(GlobalPresetItem::selector_class_name)
            .collect();
        for selection in self.group_presets(module_name, block_attrs) {
            names.extend(
                selection
                    .presets
                    .iter()
                    .map(GlobalPresetItemGroup::selector_class_name),
            );
        }
        names
    }
}
