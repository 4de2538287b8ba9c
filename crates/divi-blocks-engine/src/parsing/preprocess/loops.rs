//! Loop block duplication.

use std::ops::Range;

use divi_blocks_syntax::{TokenType, lex_delimiters};
use log::debug;
use serde_json::Value;

use super::dynamic_data;
use crate::attrs;
use crate::host::Host;

const LOOP_PATH: &str = "module.advanced.loop.desktop.value";
const LOOP_FIELD_PREFIX: &str = "loop_";

struct LoopBlock {
    span: Range<usize>,
    query: Value,
}

/// Repeat every outermost loop-enabled block once per host loop item.
///
/// Each copy resolves its `loop_<field>` dynamic tokens against its own
/// item. A loop with no items keeps the block once, untouched.
pub fn expand_loop_blocks(document: &str, host: &dyn Host) -> String {
    if !document.contains("\"loop\"") {
        return document.to_string();
    }

    let loops = find_loop_blocks(document);
    if loops.is_empty() {
        return document.to_string();
    }

    let mut out = String::with_capacity(document.len());
    let mut last = 0;
    for block in loops {
        out.push_str(&document[last..block.span.start]);
        let source = &document[block.span.clone()];
        let items = host.loop_items(&block.query);
        debug!("Loop block at {} repeats {} times", block.span.start, items.len());

        if items.is_empty() {
            out.push_str(source);
        }
        for item in &items {
            out.push_str(&dynamic_data::substitute(source, |name, _| {
                loop_field(item, name)
            }));
        }
        last = block.span.end;
    }
    out.push_str(&document[last..]);
    out
}

fn loop_field(item: &Value, name: &str) -> Option<String> {
    let field = name.strip_prefix(LOOP_FIELD_PREFIX)?;
    match attrs::get_path(item, field)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => Some(String::new()),
        other => Some(other.to_string()),
    }
}

fn loop_query(attrs: &Value) -> Option<Value> {
    let settings = attrs::get_path(attrs, LOOP_PATH)?;
    (settings.get("enable").and_then(Value::as_str) == Some("on")).then(|| settings.clone())
}

/// Spans of loop blocks not nested inside another loop block.
fn find_loop_blocks(document: &str) -> Vec<LoopBlock> {
    let mut found = Vec::new();
    // (block name, start, loop query) for every open block
    let mut open: Vec<(String, usize, Option<Value>)> = Vec::new();

    for token in lex_delimiters(document) {
        let name = token.block_name.clone().unwrap_or_default();
        let in_loop = open.iter().any(|(_, _, query)| query.is_some());

        match token.kind {
            TokenType::VoidBlock if !in_loop => {
                if let Some(query) = loop_query(&Value::Object(token.attrs)) {
                    found.push(LoopBlock {
                        span: token.start..token.start + token.len,
                        query,
                    });
                }
            }
            TokenType::BlockOpener => {
                let query = if in_loop {
                    None
                } else {
                    loop_query(&Value::Object(token.attrs.clone()))
                };
                open.push((name, token.start, query));
            }
            TokenType::BlockCloser => {
                let Some(position) = open.iter().rposition(|(open_name, _, _)| *open_name == name)
                else {
                    continue;
                };
                let (_, start, query) = open.remove(position);
                open.truncate(position);
                if let Some(query) = query {
                    found.push(LoopBlock {
                        span: start..token.start + token.len,
                        query,
                    });
                }
            }
            _ => {}
        }
    }

    found
}
