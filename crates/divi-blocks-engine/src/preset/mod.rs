pub mod attr_name_resolver;
pub mod data;
pub mod global_preset;
pub mod item;
pub mod item_group;
pub mod module_registry;
pub mod utils;

pub use attr_name_resolver::{AttrNameParams, AttrNameResolver};
pub use data::{GroupPresetRef, PresetCollection, PresetKind, PresetRecord, PresetsData};
pub use global_preset::{GlobalPreset, GroupSelection};
pub use item::GlobalPresetItem;
pub use item_group::GlobalPresetItemGroup;
pub use module_registry::{GroupDefinition, ModuleDefinition, ModuleRegistry};
pub use utils::{is_preset_id_as_default, normalize_preset_stack};
