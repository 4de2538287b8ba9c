//! Block parsing: the store-backed [`BlockParser`], the stock
//! [`DefaultBlockParser`], normalization, serialization and the text passes
//! run before parsing.

pub mod block;
pub mod default_parser;
pub mod frame;
pub mod normalize;
pub mod parser;
pub mod preprocess;
pub mod serialize;

pub use block::{BlockId, BlockParserBlock, LayoutType, ROOT_ID, layout_types};
pub use default_parser::{DefaultBlockParser, ParsedBlock};
pub use frame::BlockParserFrame;
pub use normalize::{PLACEHOLDER_BLOCK, normalize_blocks};
pub use parser::BlockParser;
pub use serialize::{serialize_block, serialize_block_attributes, serialize_blocks, strip_core_namespace};

/// The context a parse runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Front-end rendering inside the content filter.
    #[default]
    Render,
    /// Admin or query-time retrieval of blocks.
    Retrieve,
    /// Converting legacy content.
    Migration,
    /// Saving content through the REST API.
    RestSave,
}

impl ParseMode {
    /// Migration and REST saves keep global layout references as written.
    pub fn expands_global_layouts(self) -> bool {
        !matches!(self, ParseMode::Migration | ParseMode::RestSave)
    }

    /// Loop duplication and dynamic data only apply while rendering.
    pub fn is_render(self) -> bool {
        self == ParseMode::Render
    }
}
