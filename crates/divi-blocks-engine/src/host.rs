//! Seams to the surrounding CMS.
//!
//! Everything the engine needs from outside (stored posts, conditional
//! display, loop queries, dynamic content, persisted options and the filter
//! points hosts use to adjust behavior) goes through [`Host`] and
//! [`OptionsStore`]. Each [`Host`] method has a neutral default so hosts only
//! implement what they support.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::parsing::{BlockParserBlock, LayoutType};
use crate::preset::AttrNameParams;

/// A stored post as far as the engine cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub content: String,
    pub post_type: String,
    pub status: String,
}

impl Post {
    /// A published library layout, the post type global layouts live in.
    pub fn layout(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            post_type: "et_pb_layout".to_string(),
            status: "publish".to_string(),
        }
    }
}

pub trait Host {
    fn post(&self, _id: &str) -> Option<Post> {
        None
    }

    /// Whether the current visitor may read `post`.
    fn can_read(&self, _post: &Post) -> bool {
        true
    }

    /// Conditional display: `false` removes the block from first/last checks.
    fn should_render(&self, _block: &BlockParserBlock) -> bool {
        true
    }

    /// Result items of a loop query, one object per item.
    fn loop_items(&self, _query: &Value) -> Vec<Value> {
        Vec::new()
    }

    /// Value of a dynamic content field such as `post_title`.
    fn dynamic_content(&self, _name: &str, _settings: &Value) -> Option<String> {
        None
    }

    /// Filter: whether order indexes are reset before a top-level parse.
    fn filter_order_index_reset(&self, reset: bool, _layout_type: &LayoutType) -> bool {
        reset
    }

    /// Filter: the layout types order indexes are partitioned by.
    fn filter_layout_types(&self, types: Vec<LayoutType>) -> Vec<LayoutType> {
        types
    }

    /// Filter: `Some` short-circuits attribute-name resolution with its value.
    fn filter_attr_name(&self, _params: &AttrNameParams) -> Option<Option<String>> {
        None
    }
}

/// A host with no posts, no loops and no dynamic content.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}

/// In-memory host for tests and the command line.
#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    posts: HashMap<String, Post>,
    unreadable: HashSet<String>,
    hidden_blocks: HashSet<String>,
    loop_items: Vec<Value>,
    dynamic: HashMap<String, String>,
    order_index_reset: Option<bool>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post(mut self, post: Post) -> Self {
        self.posts.insert(post.id.clone(), post);
        self
    }

    pub fn with_unreadable_post(mut self, id: impl Into<String>) -> Self {
        self.unreadable.insert(id.into());
        self
    }

    /// Hide a block (by id) from conditional display.
    pub fn with_hidden_block(mut self, id: impl Into<String>) -> Self {
        self.hidden_blocks.insert(id.into());
        self
    }

    pub fn with_loop_items(mut self, items: Vec<Value>) -> Self {
        self.loop_items = items;
        self
    }

    pub fn with_dynamic(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dynamic.insert(name.into(), value.into());
        self
    }

    pub fn with_order_index_reset(mut self, reset: bool) -> Self {
        self.order_index_reset = Some(reset);
        self
    }

    pub fn insert_post(&mut self, post: Post) {
        self.posts.insert(post.id.clone(), post);
    }
}

impl Host for MemoryHost {
    fn post(&self, id: &str) -> Option<Post> {
        self.posts.get(id).cloned()
    }

    fn can_read(&self, post: &Post) -> bool {
        !self.unreadable.contains(&post.id)
    }

    fn should_render(&self, block: &BlockParserBlock) -> bool {
        !self.hidden_blocks.contains(block.id.as_str())
    }

    fn loop_items(&self, _query: &Value) -> Vec<Value> {
        self.loop_items.clone()
    }

    fn dynamic_content(&self, name: &str, _settings: &Value) -> Option<String> {
        self.dynamic.get(name).cloned()
    }

    fn filter_order_index_reset(&self, reset: bool, _layout_type: &LayoutType) -> bool {
        self.order_index_reset.unwrap_or(reset)
    }
}

/// Key-value persistence for presets and global data.
pub trait OptionsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryOptions {
    values: HashMap<String, Value>,
}

impl MemoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }
}

impl OptionsStore for MemoryOptions {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}
