//! Divi block engine: a store-backed block parser and the preset resolution
//! that turns a parsed block into its final attributes.
//!
//! ```
//! use divi_blocks_engine::{BlockParser, BlockParserStore, NullHost};
//!
//! let mut store = BlockParserStore::new();
//! let blocks = BlockParser::default().parse("<!-- wp:divi/section /-->", &mut store, &NullHost);
//!
//! assert_eq!(blocks[0].block_name.as_deref(), Some("divi/section"));
//! assert!(store.get("divi/section-0").is_some());
//! ```

pub mod attrs;
pub mod error;
pub mod global_data;
pub mod host;
pub mod parsing;
pub mod preset;
pub mod store;

pub use error::PresetError;
pub use global_data::{FilterMode, GlobalData};
pub use host::{Host, MemoryHost, MemoryOptions, NullHost, OptionsStore, Post};
pub use parsing::{
    BlockId, BlockParser, BlockParserBlock, BlockParserFrame, DefaultBlockParser, LayoutType,
    ParseMode, ParsedBlock, ROOT_ID, layout_types, normalize_blocks, serialize_block,
    serialize_blocks,
};
pub use preset::{GlobalPreset, GlobalPresetItem, GlobalPresetItemGroup, ModuleRegistry};
pub use store::{BlockParserStore, SiblingLocation};
