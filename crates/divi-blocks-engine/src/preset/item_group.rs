use std::collections::BTreeSet;

use log::trace;
use serde_json::{Map, Value};

use super::attr_name_resolver::{AttrNameParams, AttrNameResolver};
use super::data::PresetRecord;
use super::utils::{is_preset_id_as_default, selector_class_name};
use crate::attrs;
use crate::host::Host;

/// Group paths are `<attr>.<section>.<key>`.
const GROUP_PATH_DEPTH: usize = 3;

/// A group preset selected for one group of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPresetItemGroup {
    record: PresetRecord,
    group_id: String,
    group_name: String,
    default_id: String,
    default_priority: i64,
}

impl GlobalPresetItemGroup {
    pub fn new(
        record: PresetRecord,
        group_id: impl Into<String>,
        group_name: impl Into<String>,
        default_id: impl Into<String>,
        default_priority: i64,
    ) -> Self {
        Self {
            record,
            group_id: group_id.into(),
            group_name: group_name.into(),
            default_id: default_id.into(),
            default_priority,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// The block group this preset is applied to.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn priority(&self) -> i64 {
        self.record.priority.unwrap_or(self.default_priority)
    }

    pub fn is_default(&self) -> bool {
        is_preset_id_as_default(&self.record.id, &self.default_id)
    }

    /// The preset's own attributes, at the paths it was authored with.
    pub fn raw_attrs(&self) -> Value {
        attrs::merge_all([&self.record.attrs, &self.record.render_attrs])
    }

    /// Group paths the preset was authored against.
    pub fn source_attr_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = attrs::collect_paths(&self.raw_attrs(), GROUP_PATH_DEPTH)
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        if let Some(group_id) = self.record.group_id.as_ref().filter(|id| id.contains('.')) {
            names.insert(group_id.clone());
        }
        names.into_iter().collect()
    }

    /// The preset's attributes moved onto `target_attr_names`.
    ///
    /// Paths the resolver cannot place are dropped.
    pub fn data_attrs_for(
        &self,
        target_attr_names: &[String],
        resolver: &AttrNameResolver,
        host: &dyn Host,
    ) -> Value {
        let source_attr_names = self.source_attr_names();
        let mut out = Value::Object(Map::new());

        for (path, value) in attrs::collect_paths(&self.raw_attrs(), GROUP_PATH_DEPTH) {
            let params = AttrNameParams::new(
                path.clone(),
                source_attr_names.clone(),
                target_attr_names.to_vec(),
            );
            let Some(target) = resolver.resolve(&params, host) else {
                trace!("Group preset {} has no place for {path}", self.record.id);
                continue;
            };
            let merged = match attrs::get_path(&out, &target) {
                Some(existing) => attrs::merge(existing, &value),
                None => value,
            };
            attrs::set_path(&mut out, &target, merged);
        }
        out
    }

    pub fn selector_class_name(&self) -> String {
        selector_class_name("group", &self.group_name, &self.record.id, &self.default_id)
    }

    pub fn record(&self) -> &PresetRecord {
        &self.record
    }
}
