//! `$variable({...})$` tokens.
//!
//! A token wraps a JSON payload `{"type": ..., "value": {"name": ...,
//! "settings": {...}}}`. Inside block attributes the payload sits in a JSON
//! string, so its quotes arrive escaped as `\"` or `\u0022`.

use std::ops::Range;

use log::trace;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::parsing::serialize::json_escape;

const OPEN: &str = "$variable(";
const CLOSE: &str = ")$";

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DynamicVariable {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: VariableValue,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VariableValue {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// A token located in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicToken {
    pub variable: DynamicVariable,
    /// Byte range of the whole token including `$variable(` and `)$`.
    pub range: Range<usize>,
    /// Whether the payload was found JSON-escaped inside a string.
    pub escaped: bool,
}

/// Decode a payload. `None` for malformed JSON.
pub fn parse_variable(payload: &str) -> Option<DynamicVariable> {
    decode_payload(payload).map(|(variable, _)| variable)
}

/// Decode a payload as written, falling back to unescaping its quotes.
/// The flag is `true` when the fallback was needed.
fn decode_payload(payload: &str) -> Option<(DynamicVariable, bool)> {
    if let Ok(variable) = serde_json::from_str(payload) {
        return Some((variable, false));
    }
    serde_json::from_str(&unescape(payload))
        .ok()
        .map(|variable| (variable, true))
}

fn unescape(payload: &str) -> String {
    payload
        .replace("\\u0022", "\"")
        .replace("\\\"", "\"")
}

/// Find every well-formed token in `document`.
pub fn find_tokens(document: &str) -> Vec<DynamicToken> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(found) = document[cursor..].find(OPEN) {
        let start = cursor + found;
        let payload_start = start + OPEN.len();
        let Some(len) = document[payload_start..].find(CLOSE) else {
            break;
        };
        let payload = &document[payload_start..payload_start + len];
        let end = payload_start + len + CLOSE.len();

        match decode_payload(payload) {
            Some((variable, escaped)) => tokens.push(DynamicToken {
                variable,
                range: start..end,
                escaped,
            }),
            None => trace!("Skipping malformed dynamic token at {start}"),
        }
        cursor = end;
    }

    tokens
}

/// Replace `content` tokens with what `resolve(name, settings)` returns.
///
/// The settings' `before` and `after` strings wrap the resolved value.
/// Tokens the resolver does not know are left intact.
pub fn substitute(
    document: &str,
    mut resolve: impl FnMut(&str, &Value) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(document.len());
    let mut last = 0;

    for token in find_tokens(document) {
        if token.variable.kind != "content" {
            continue;
        }
        let settings = Value::Object(token.variable.value.settings.clone());
        let Some(value) = resolve(&token.variable.value.name, &settings) else {
            continue;
        };

        let text = |key: &str| settings.get(key).and_then(Value::as_str).unwrap_or_default();
        let replacement = format!("{}{value}{}", text("before"), text("after"));

        out.push_str(&document[last..token.range.start]);
        if token.escaped {
            out.push_str(&json_escape(&replacement));
        } else {
            out.push_str(&replacement);
        }
        last = token.range.end;
    }

    out.push_str(&document[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn title(name: &str, _: &Value) -> Option<String> {
        (name == "post_title").then(|| "Hello \"World\"".to_string())
    }

    #[test]
    fn raw_tokens_are_replaced() {
        let doc = r#"<h1>$variable({"type":"content","value":{"name":"post_title","settings":{"before":"[","after":"]"}}})$</h1>"#;
        assert_eq!(substitute(doc, title), "<h1>[Hello \"World\"]</h1>");
    }

    #[test]
    fn escaped_tokens_get_escaped_values() {
        let doc = r#"{"text":"$variable({\"type\":\"content\",\"value\":{\"name\":\"post_title\"}})$"}"#;
        assert_eq!(substitute(doc, title), r#"{"text":"Hello \"World\""}"#);
    }

    #[test]
    fn raw_tokens_keep_escaped_quotes_in_settings() {
        let doc = r#"$variable({"type":"content","value":{"name":"post_title","settings":{"before":"\"","after":"\""}}})$"#;

        let tokens = find_tokens(doc);
        assert_eq!(tokens.len(), 1);
        assert!(!tokens[0].escaped);
        assert_eq!(substitute(doc, |_, _| Some("T".to_string())), "\"T\"");
    }

    #[test]
    fn unknown_and_non_content_tokens_stay() {
        let doc = r#"$variable({"type":"content","value":{"name":"nope"}})$ $variable({"type":"color","value":{"name":"gcid-1"}})$"#;
        assert_eq!(substitute(doc, title), doc);
    }

    #[test]
    fn malformed_payload_is_skipped() {
        let doc = "$variable({oops)$ $variable(";
        assert!(find_tokens(doc).is_empty());
        assert_eq!(substitute(doc, title), doc);
    }
}
