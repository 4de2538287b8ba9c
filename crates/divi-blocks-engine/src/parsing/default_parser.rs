//! The stock block parser.
//!
//! Builds owned [`ParsedBlock`] trees and never touches a store. Used when
//! content carries no Divi markers, and to re-parse stored layouts while
//! inlining them.

use divi_blocks_syntax::{BlockCommentLexer, Token, TokenSource, TokenType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::frame::BlockParserFrame;

/// The block record handed back to callers and to the serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBlock {
    pub block_name: Option<String>,
    pub attrs: Value,
    pub inner_blocks: Vec<ParsedBlock>,
    #[serde(rename = "innerHTML")]
    pub inner_html: String,
    pub inner_content: Vec<Option<String>>,
}

impl ParsedBlock {
    pub fn new(name: impl Into<String>, attrs: Map<String, Value>) -> Self {
        Self {
            block_name: Some(name.into()),
            attrs: Value::Object(attrs),
            inner_blocks: Vec::new(),
            inner_html: String::new(),
            inner_content: Vec::new(),
        }
    }

    /// A nameless block holding raw HTML.
    pub fn freeform(html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            block_name: None,
            attrs: Value::Object(Map::new()),
            inner_blocks: Vec::new(),
            inner_content: vec![Some(html.clone())],
            inner_html: html,
        }
    }

    pub fn is_freeform(&self) -> bool {
        self.block_name.is_none()
    }

    pub fn name(&self) -> &str {
        self.block_name.as_deref().unwrap_or_default()
    }

    /// Replace the children, keeping the HTML before the first child and
    /// after the last one.
    pub fn replace_inner_blocks(&mut self, blocks: Vec<ParsedBlock>) {
        let first_slot = self.inner_content.iter().position(Option::is_none);
        let last_slot = self.inner_content.iter().rposition(Option::is_none);

        let (leading, trailing): (Vec<_>, Vec<_>) = match (first_slot, last_slot) {
            (Some(first), Some(last)) => (
                self.inner_content[..first].to_vec(),
                self.inner_content[last + 1..].to_vec(),
            ),
            _ => (self.inner_content.clone(), Vec::new()),
        };

        let mut inner_content = leading;
        inner_content.extend(blocks.iter().map(|_| None));
        inner_content.extend(trailing);

        self.inner_html = inner_content.iter().flatten().map(String::as_str).collect();
        self.inner_content = inner_content;
        self.inner_blocks = blocks;
    }
}

/// WordPress-compatible block parser over a [`TokenSource`].
#[derive(Debug, Default)]
pub struct DefaultBlockParser<T = BlockCommentLexer> {
    tokens: T,
    document: String,
    offset: usize,
    stack: Vec<BlockParserFrame<ParsedBlock>>,
    output: Vec<ParsedBlock>,
}

impl DefaultBlockParser {
    pub fn new() -> Self {
        Self::with_token_source(BlockCommentLexer)
    }
}

impl<T: TokenSource> DefaultBlockParser<T> {
    pub fn with_token_source(tokens: T) -> Self {
        Self {
            tokens,
            document: String::new(),
            offset: 0,
            stack: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn parse(&mut self, document: &str) -> Vec<ParsedBlock> {
        self.document = document.to_string();
        self.offset = 0;
        self.stack.clear();
        self.output.clear();

        while self.proceed() {}

        std::mem::take(&mut self.output)
    }

    fn proceed(&mut self) -> bool {
        let token = self.tokens.next_token(&self.document, self.offset);
        let depth = self.stack.len();
        let leading_html_start = (token.start > self.offset).then_some(self.offset);

        match token.kind {
            TokenType::NoMoreTokens => {
                if depth == 0 {
                    self.add_freeform();
                }
                while !self.stack.is_empty() {
                    self.add_block_from_stack(None);
                }
                false
            }
            TokenType::VoidBlock => {
                let block = Self::block_from(&token);
                if depth == 0 {
                    if let Some(start) = leading_html_start {
                        self.output
                            .push(ParsedBlock::freeform(&self.document[start..token.start]));
                    }
                    self.output.push(block);
                } else {
                    self.add_inner_block(block, token.start, token.len, None);
                }
                self.offset = token.end();
                true
            }
            TokenType::BlockOpener => {
                self.stack.push(BlockParserFrame::new(
                    Self::block_from(&token),
                    token.start,
                    token.len,
                    token.end(),
                    leading_html_start,
                ));
                self.offset = token.end();
                true
            }
            TokenType::BlockCloser => {
                if depth == 0 {
                    self.add_freeform();
                    return false;
                }
                if depth == 1 {
                    self.add_block_from_stack(Some(token.start));
                    self.offset = token.end();
                    return true;
                }

                let Some(mut top) = self.stack.pop() else {
                    return false;
                };
                let html = &self.document[top.prev_offset..token.start];
                top.block.inner_html.push_str(html);
                top.block.inner_content.push(Some(html.to_string()));
                self.add_inner_block(top.block, top.token_start, top.token_length, Some(token.end()));
                self.offset = token.end();
                true
            }
            TokenType::Other => {
                self.add_freeform();
                false
            }
        }
    }

    fn block_from(token: &Token) -> ParsedBlock {
        ParsedBlock::new(
            token.block_name.clone().unwrap_or_default(),
            token.attrs.clone(),
        )
    }

    fn add_freeform(&mut self) {
        if self.offset >= self.document.len() {
            return;
        }
        self.output
            .push(ParsedBlock::freeform(&self.document[self.offset..]));
    }

    fn add_inner_block(
        &mut self,
        block: ParsedBlock,
        token_start: usize,
        token_length: usize,
        last_offset: Option<usize>,
    ) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        let html = &self.document[parent.prev_offset..token_start];
        if !html.is_empty() {
            parent.block.inner_html.push_str(html);
            parent.block.inner_content.push(Some(html.to_string()));
        }
        parent.block.inner_blocks.push(block);
        parent.block.inner_content.push(None);
        parent.prev_offset = last_offset.unwrap_or(token_start + token_length);
    }

    fn add_block_from_stack(&mut self, end_offset: Option<usize>) {
        let Some(mut top) = self.stack.pop() else {
            return;
        };
        let html = match end_offset {
            Some(end) => &self.document[top.prev_offset..end],
            None => &self.document[top.prev_offset..],
        };
        if !html.is_empty() {
            top.block.inner_html.push_str(html);
            top.block.inner_content.push(Some(html.to_string()));
        }
        if let Some(start) = top.leading_html_start {
            self.output
                .push(ParsedBlock::freeform(&self.document[start..top.token_start]));
        }
        self.output.push(top.block);
    }
}
