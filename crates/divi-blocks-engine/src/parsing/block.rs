use std::borrow::Borrow;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::attrs;
use crate::host::Host;
use crate::store::BlockParserStore;

/// Id of the synthetic root block every top-level block hangs off.
pub const ROOT_ID: &str = "divi/root";

/// Block id of the form `{block_name}-{order_index}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BlockId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The layout context a block was parsed in.
///
/// Order indexes are counted separately per layout type so a header layout
/// and the body it wraps number their modules independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LayoutType {
    #[default]
    Default,
    HeaderLayout,
    BodyLayout,
    FooterLayout,
    Migration,
    GlobalLayout,
    SavingContent,
    /// A layout type registered by the host.
    Other(String),
}

impl LayoutType {
    pub fn as_str(&self) -> &str {
        match self {
            LayoutType::Default => "default",
            LayoutType::HeaderLayout => "et_header_layout",
            LayoutType::BodyLayout => "et_body_layout",
            LayoutType::FooterLayout => "et_footer_layout",
            LayoutType::Migration => "migration",
            LayoutType::GlobalLayout => "global_layout",
            LayoutType::SavingContent => "saving_content",
            LayoutType::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "default" | "" => LayoutType::Default,
            "et_header_layout" => LayoutType::HeaderLayout,
            "et_body_layout" => LayoutType::BodyLayout,
            "et_footer_layout" => LayoutType::FooterLayout,
            "migration" => LayoutType::Migration,
            "global_layout" => LayoutType::GlobalLayout,
            "saving_content" => LayoutType::SavingContent,
            other => LayoutType::Other(other.to_string()),
        }
    }

    /// Layout types known without host registration.
    pub fn builtin() -> Vec<LayoutType> {
        vec![
            LayoutType::Default,
            LayoutType::HeaderLayout,
            LayoutType::BodyLayout,
            LayoutType::FooterLayout,
            LayoutType::Migration,
            LayoutType::GlobalLayout,
            LayoutType::SavingContent,
        ]
    }
}

/// Built-in layout types plus whatever the host registers.
pub fn layout_types(host: &dyn Host) -> Vec<LayoutType> {
    host.filter_layout_types(LayoutType::builtin())
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LayoutType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A parsed block as kept in the [`BlockParserStore`].
///
/// Blocks refer to each other by id only. `parent_id` is a back-reference;
/// the store answers every tree question by scanning it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockParserBlock {
    pub id: BlockId,
    pub block_name: Option<String>,
    pub attrs: Value,
    pub inner_blocks: Vec<BlockId>,
    #[serde(rename = "innerHTML")]
    pub inner_html: String,
    pub inner_content: Vec<Option<String>>,
    pub parent_id: Option<BlockId>,
    /// Parse order across the lifetime of the store.
    pub index: u64,
    /// Per module and layout type counter used for CSS class numbering.
    pub order_index: u64,
    pub store_instance: usize,
    pub layout_type: LayoutType,
}

impl BlockParserBlock {
    /// Create a block, drawing its index and order index from `store`.
    pub fn new(name: &str, attrs: Map<String, Value>, store: &mut BlockParserStore) -> Self {
        let layout_type = store.layout_type();
        let order_index = store.module_order_mut().next(name, &layout_type);
        Self {
            id: BlockId::new(format!("{name}-{order_index}")),
            block_name: Some(name.to_string()),
            attrs: Value::Object(attrs),
            inner_blocks: Vec::new(),
            inner_html: String::new(),
            inner_content: Vec::new(),
            parent_id: None,
            index: store.next_block_index(),
            order_index,
            store_instance: store.current_instance(),
            layout_type,
        }
    }

    /// The synthetic root of a store instance.
    pub fn root(store_instance: usize, inner_blocks: Vec<BlockId>) -> Self {
        Self {
            id: BlockId::root(),
            block_name: Some(ROOT_ID.to_string()),
            attrs: Value::Object(Map::new()),
            inner_blocks,
            inner_html: String::new(),
            inner_content: Vec::new(),
            parent_id: None,
            index: 0,
            order_index: 0,
            store_instance,
            layout_type: LayoutType::Default,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    pub fn name(&self) -> &str {
        self.block_name.as_deref().unwrap_or_default()
    }

    pub fn attr(&self, path: &str) -> Option<&Value> {
        attrs::get_path(&self.attrs, path)
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.inner_html.push_str(html);
        self.inner_content.push(Some(html.to_string()));
    }
}
