//! Inlining of saved global layouts.

use divi_blocks_config::ParserConfig;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use super::BlockParserStore;
use crate::attrs;
use crate::host::{Host, Post};
use crate::parsing::{
    DefaultBlockParser, LayoutType, ParsedBlock, normalize_blocks, serialize_block,
};

/// Criteria a referenced post must meet to be inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalLayoutMatch {
    pub post_type: String,
    pub status: String,
}

impl Default for GlobalLayoutMatch {
    fn default() -> Self {
        Self {
            post_type: "et_pb_layout".to_string(),
            status: "publish".to_string(),
        }
    }
}

impl GlobalLayoutMatch {
    pub fn matches(&self, post: &Post) -> bool {
        post.post_type == self.post_type && post.status == self.status
    }
}

/// A `divi/global-layout` reference found in content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalLayoutRequest {
    pub post_id: String,
    /// Attribute snapshot saved with the reference.
    pub local_attrs: Option<Value>,
    /// Serialized children saved with the reference.
    pub local_children: Option<String>,
    pub criteria: GlobalLayoutMatch,
}

impl GlobalLayoutRequest {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            ..Self::default()
        }
    }
}

/// One `localAttrsMap` entry declared by a template block.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalAttrEntry {
    attr_name: String,
    #[serde(default)]
    sub_name: Option<String>,
}

impl LocalAttrEntry {
    fn path(&self) -> String {
        match self.sub_name.as_deref() {
            Some(sub) if !sub.is_empty() => format!("{}.{sub}", self.attr_name),
            _ => self.attr_name.clone(),
        }
    }
}

impl BlockParserStore {
    /// Expand a global layout reference into serialized block content.
    ///
    /// Returns `None` when the post is missing, fails `request.criteria` or
    /// cannot be read, when it holds no block with attributes, and when
    /// called while another expansion is running. The layout stack and the
    /// module order counters are restored before returning.
    pub fn get_global_layout_content(
        &mut self,
        request: &GlobalLayoutRequest,
        host: &dyn Host,
        config: &ParserConfig,
    ) -> Option<String> {
        if self.in_global_layout {
            debug!("Skipping nested global layout {}", request.post_id);
            return None;
        }

        self.in_global_layout = true;
        self.set_layout(request.post_id.clone(), LayoutType::GlobalLayout);
        let saved_order = self.module_order.clone();

        let content = expand(request, host, config);

        self.module_order = saved_order;
        self.reset_layout();
        self.in_global_layout = false;

        content
    }
}

fn expand(request: &GlobalLayoutRequest, host: &dyn Host, config: &ParserConfig) -> Option<String> {
    let Some(post) = host.post(&request.post_id) else {
        warn!("Global layout {} not found", request.post_id);
        return None;
    };
    if !request.criteria.matches(&post) || !host.can_read(&post) {
        debug!("Global layout {} does not match or is not readable", post.id);
        return None;
    }

    let blocks = normalize_blocks(
        DefaultBlockParser::new().parse(&post.content),
        config.max_block_depth,
    );
    let mut block = blocks
        .into_iter()
        .find(|block| !block.is_freeform() && !attrs::is_empty(&block.attrs))?;

    if let Some(snapshot) = request.local_attrs.as_ref().and_then(decode_snapshot) {
        apply_local_attrs(&mut block, &snapshot);
    }

    if let Some(children) = request.local_children.as_deref()
        && accepts_local_children(&block)
    {
        let children = normalize_blocks(
            DefaultBlockParser::new().parse(children),
            config.max_block_depth,
        );
        block.replace_inner_blocks(children);
    }

    attrs::set_path(
        &mut block.attrs,
        "globalModule",
        Value::String(request.post_id.clone()),
    );
    Some(serialize_block(&block))
}

/// Snapshots are stored either as an object or as a JSON string.
fn decode_snapshot(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(decoded @ Value::Object(_)) => Some(decoded),
            _ => {
                warn!("Ignoring malformed global layout snapshot");
                None
            }
        },
        _ => None,
    }
}

/// Pull every mapped path from `snapshot` into the block's attributes.
///
/// Entries apply shortest path first so a `subName` entry wins over a whole
/// attribute entry covering the same region.
fn apply_local_attrs(block: &mut ParsedBlock, snapshot: &Value) {
    let Some(map) = attrs::get_path(&block.attrs, "localAttrsMap") else {
        return;
    };
    let mut entries: Vec<LocalAttrEntry> = match serde_json::from_value(map.clone()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Ignoring malformed localAttrsMap: {e}");
            return;
        }
    };
    entries.sort_by_key(|entry| entry.path().split('.').count());

    for entry in entries {
        let path = entry.path();
        if let Some(value) = attrs::get_path(snapshot, &path) {
            attrs::set_path(&mut block.attrs, &path, value.clone());
        }
    }
}

fn accepts_local_children(block: &ParsedBlock) -> bool {
    match attrs::get_path(&block.attrs, "localChildren") {
        Some(Value::Bool(enabled)) => *enabled,
        Some(Value::String(value)) => value == "on",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const TEMPLATE: &str = r#"<!-- wp:divi/section {"title":{"innerContent":{"desktop":{"value":"Template"}}},"background":{"color":"red"},"localAttrsMap":[{"attrName":"title"},{"attrName":"background","subName":"color"}]} --><div><!-- wp:divi/text /--></div><!-- /wp:divi/section -->"#;

    fn host() -> MemoryHost {
        MemoryHost::new().with_post(Post::layout("42", TEMPLATE))
    }

    fn expand_with(request: &GlobalLayoutRequest, host: &MemoryHost) -> Option<ParsedBlock> {
        let mut store = BlockParserStore::new();
        let content = store.get_global_layout_content(request, host, &ParserConfig::default())?;
        assert!(!store.is_in_global_layout());
        assert_eq!(store.layout_type(), LayoutType::Default);
        DefaultBlockParser::new().parse(&content).into_iter().next()
    }

    #[test]
    fn inlines_template_with_reference() {
        let block = expand_with(&GlobalLayoutRequest::new("42"), &host()).unwrap();
        assert_eq!(block.name(), "divi/section");
        assert_eq!(block.attrs["globalModule"], json!("42"));
        assert_eq!(block.inner_blocks[0].name(), "divi/text");
    }

    #[test]
    fn only_mapped_paths_come_from_snapshot() {
        let request = GlobalLayoutRequest {
            local_attrs: Some(json!({
                "title": {"innerContent": {"desktop": {"value": "Local"}}},
                "background": {"color": "blue", "image": "x.png"},
                "spacing": {"margin": "10px"}
            })),
            ..GlobalLayoutRequest::new("42")
        };

        let block = expand_with(&request, &host()).unwrap();

        assert_eq!(block.attrs["title"]["innerContent"]["desktop"]["value"], "Local");
        assert_eq!(block.attrs["background"], json!({"color": "blue"}));
        assert!(block.attrs.get("spacing").is_none());
    }

    #[test]
    fn missing_unreadable_and_mismatched_posts_yield_none() {
        assert!(expand_with(&GlobalLayoutRequest::new("7"), &host()).is_none());
        assert!(expand_with(&GlobalLayoutRequest::new("42"), &host().with_unreadable_post("42")).is_none());

        let draft = MemoryHost::new().with_post(Post {
            status: "draft".into(),
            ..Post::layout("42", TEMPLATE)
        });
        assert!(expand_with(&GlobalLayoutRequest::new("42"), &draft).is_none());
    }

    #[test]
    fn local_children_replace_template_children() {
        let template = r#"<!-- wp:divi/row {"localChildren":"on"} --><div><!-- wp:divi/text /--></div><!-- /wp:divi/row -->"#;
        let host = MemoryHost::new().with_post(Post::layout("9", template));
        let request = GlobalLayoutRequest {
            local_children: Some("<!-- wp:divi/image /--><!-- wp:divi/button /-->".into()),
            ..GlobalLayoutRequest::new("9")
        };

        let block = expand_with(&request, &host).unwrap();

        let names: Vec<_> = block.inner_blocks.iter().map(ParsedBlock::name).collect();
        assert_eq!(names, vec!["divi/image", "divi/button"]);
        assert_eq!(block.inner_content.first(), Some(&Some("<div>".to_string())));
    }

    #[test]
    fn nested_expansion_is_refused() {
        let mut store = BlockParserStore::new();
        store.in_global_layout = true;
        let content =
            store.get_global_layout_content(&GlobalLayoutRequest::new("42"), &host(), &ParserConfig::default());
        assert!(content.is_none());
    }
}
