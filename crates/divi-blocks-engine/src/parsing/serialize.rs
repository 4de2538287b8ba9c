//! Block serialization back to comment-delimited markup.
//!
//! The output matches what WordPress writes for the same records, so content
//! rebuilt here (inlined global layouts, duplicated loop blocks) parses back
//! to the same tree.

use serde_json::Value;

use super::default_parser::ParsedBlock;

pub fn serialize_blocks(blocks: &[ParsedBlock]) -> String {
    blocks.iter().map(serialize_block).collect()
}

pub fn serialize_block(block: &ParsedBlock) -> String {
    let mut children = block.inner_blocks.iter();
    let mut content = String::new();
    for chunk in &block.inner_content {
        match chunk {
            Some(html) => content.push_str(html),
            None => {
                if let Some(child) = children.next() {
                    content.push_str(&serialize_block(child));
                }
            }
        }
    }

    match block.block_name.as_deref() {
        None | Some("") => content,
        Some(name) => delimited_content(name, &block.attrs, &content),
    }
}

fn delimited_content(name: &str, attrs: &Value, content: &str) -> String {
    let name = strip_core_namespace(name);
    let attrs = if crate::attrs::is_empty(attrs) {
        String::new()
    } else {
        format!("{} ", serialize_block_attributes(attrs))
    };

    if content.is_empty() {
        format!("<!-- wp:{name} {attrs}/-->")
    } else {
        format!("<!-- wp:{name} {attrs}-->{content}<!-- /wp:{name} -->")
    }
}

/// Encode attributes as JSON that cannot terminate the surrounding comment.
pub fn serialize_block_attributes(attrs: &Value) -> String {
    attrs
        .to_string()
        .replace("--", "\\u002d\\u002d")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        // Escaped quotes inside strings
        .replace("\\\"", "\\u0022")
}

pub fn strip_core_namespace(name: &str) -> &str {
    name.strip_prefix("core/").unwrap_or(name)
}

/// Escape `text` for embedding inside a JSON string literal, without quotes.
pub fn json_escape(text: &str) -> String {
    let quoted = Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::DefaultBlockParser;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    #[test]
    fn void_block_without_attrs() {
        let block = ParsedBlock::new("divi/section", Map::new());
        assert_eq!(serialize_block(&block), "<!-- wp:divi/section /-->");
    }

    #[test]
    fn core_namespace_is_stripped() {
        let mut block = ParsedBlock::new("core/paragraph", Map::new());
        block.inner_content = vec![Some("<p>x</p>".into())];
        assert_eq!(
            serialize_block(&block),
            "<!-- wp:paragraph --><p>x</p><!-- /wp:paragraph -->"
        );
    }

    #[test]
    fn attributes_are_comment_safe() {
        let attrs = json!({"html": "<a href=\"x\">--&</a>"});
        assert_eq!(
            serialize_block_attributes(&attrs),
            r#"{"html":"\u003ca href=\u0022x\u0022\u003e\u002d\u002d\u0026\u003c/a\u003e"}"#
        );
    }

    #[test]
    fn parse_then_serialize_is_stable() {
        let doc = "<!-- wp:divi/section {\"a\":{\"b\":1}} --><div><!-- wp:divi/text /--></div><!-- /wp:divi/section -->tail";
        let blocks = DefaultBlockParser::new().parse(doc);
        assert_eq!(serialize_blocks(&blocks), doc);
    }

    #[test]
    fn json_escape_has_no_quotes() {
        assert_eq!(json_escape("say \"hi\"\n"), "say \\\"hi\\\"\\n");
    }
}
