use std::sync::OnceLock;

use divi_blocks_config::ParserConfig;
use log::{debug, warn};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::host::Host;
use crate::store::{BlockParserStore, GlobalLayoutRequest};

fn global_layout_regex() -> &'static Regex {
    static GLOBAL_LAYOUT_REGEX: OnceLock<Regex> = OnceLock::new();
    GLOBAL_LAYOUT_REGEX.get_or_init(|| {
        Regex::new(
            r"(?s)<!--\s+wp:divi/global-layout\s+(\{.*?\})\s+(?:/-->|-->(.*?)<!--\s+/wp:divi/global-layout\s+-->)",
        )
        .expect("Invalid global layout regex")
    })
}

/// Replace every `divi/global-layout` reference with the layout it names.
///
/// References that cannot be resolved are removed.
pub fn inline_global_layouts(
    document: &str,
    store: &mut BlockParserStore,
    host: &dyn Host,
    config: &ParserConfig,
) -> String {
    if store.is_in_global_layout() || !document.contains("wp:divi/global-layout") {
        return document.to_string();
    }

    global_layout_regex()
        .replace_all(document, |caps: &Captures<'_>| {
            let Some(request) = request_from(caps) else {
                warn!("Dropping global layout reference without a module id");
                return String::new();
            };
            debug!("Inlining global layout {}", request.post_id);
            store
                .get_global_layout_content(&request, host, config)
                .unwrap_or_default()
        })
        .into_owned()
}

fn request_from(caps: &Captures<'_>) -> Option<GlobalLayoutRequest> {
    let attrs: Value = serde_json::from_str(caps.get(1)?.as_str()).ok()?;
    let post_id = match attrs.get("globalModule")? {
        Value::String(id) if !id.is_empty() => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    let local_children = caps
        .get(2)
        .map(|children| children.as_str())
        .filter(|children| !children.trim().is_empty())
        .map(str::to_string);

    Some(GlobalLayoutRequest {
        local_attrs: attrs.get("localAttrs").cloned(),
        local_children,
        ..GlobalLayoutRequest::new(post_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryHost, Post};
    use pretty_assertions::assert_eq;

    fn host() -> MemoryHost {
        MemoryHost::new().with_post(Post::layout(
            "5",
            r#"<!-- wp:divi/text {"content":"saved"} /-->"#,
        ))
    }

    #[test]
    fn void_reference_is_replaced() {
        let mut store = BlockParserStore::new();
        let doc = r#"<p>a</p><!-- wp:divi/global-layout {"globalModule":5} /--><p>b</p>"#;

        let out = inline_global_layouts(doc, &mut store, &host(), &ParserConfig::default());

        assert_eq!(
            out,
            r#"<p>a</p><!-- wp:divi/text {"content":"saved","globalModule":"5"} /--><p>b</p>"#
        );
    }

    #[test]
    fn unresolved_reference_is_removed() {
        let mut store = BlockParserStore::new();
        let doc = r#"<!-- wp:divi/global-layout {"globalModule":"404"} --><!-- wp:divi/text /--><!-- /wp:divi/global-layout -->x"#;

        let out = inline_global_layouts(doc, &mut store, &host(), &ParserConfig::default());

        assert_eq!(out, "x");
    }

    #[test]
    fn paired_reference_carries_children() {
        let caps = global_layout_regex()
            .captures(r#"<!-- wp:divi/global-layout {"globalModule":"5","localAttrs":{"a":1}} --><!-- wp:divi/image /--><!-- /wp:divi/global-layout -->"#)
            .unwrap();
        let request = request_from(&caps).unwrap();

        assert_eq!(request.post_id, "5");
        assert_eq!(request.local_attrs, Some(serde_json::json!({"a": 1})));
        assert_eq!(request.local_children.as_deref(), Some("<!-- wp:divi/image /-->"));
    }
}
