//! # Block Parser - Store-Backed State Machine
//!
//! [`BlockParser`] walks block delimiters with an explicit stack of
//! [`BlockParserFrame`]s and registers every block it meets in a
//! [`BlockParserStore`]. The store, not the parser, owns the blocks; the
//! parser only keeps their ids.
//!
//! Malformed input never fails the parse. Unterminated blocks are closed at
//! the end of the document, a closer without an opener ends the parse with
//! the remaining text as freeform HTML, and anything a token source cannot
//! classify is treated the same way.
//!
//! Before parsing, content without Divi markers (or wrapped in structural
//! WordPress blocks) is handed to the [`DefaultBlockParser`] untouched.
//! Divi content is preprocessed: global layouts are inlined, and in
//! [`ParseMode::Render`] loop blocks are duplicated and dynamic data is
//! substituted.

use divi_blocks_config::ParserConfig;
use divi_blocks_syntax::{BlockCommentLexer, Token, TokenSource, TokenType};
use log::{debug, trace};

use super::preprocess::{expand_loop_blocks, inline_global_layouts, substitute};
use super::{
    BlockId, BlockParserBlock, BlockParserFrame, DefaultBlockParser, ParseMode, ParsedBlock,
};
use crate::host::Host;
use crate::store::BlockParserStore;

/// A top-level parse result before it is read back from the store.
#[derive(Debug, Clone, PartialEq)]
enum Output {
    Freeform(String),
    Block(BlockId),
}

#[derive(Debug)]
pub struct BlockParser<T = BlockCommentLexer> {
    config: ParserConfig,
    mode: ParseMode,
    tokens: T,
    document: String,
    offset: usize,
    stack: Vec<BlockParserFrame<BlockId>>,
    output: Vec<Output>,
}

impl BlockParser {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_token_source(config, BlockCommentLexer)
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl<T: TokenSource + Clone> BlockParser<T> {
    pub fn with_token_source(config: ParserConfig, tokens: T) -> Self {
        Self {
            config,
            mode: ParseMode::default(),
            tokens,
            document: String::new(),
            offset: 0,
            stack: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Whether `document` is handled by this parser rather than delegated.
    pub fn handles(&self, document: &str) -> bool {
        let has_divi_marker = self
            .config
            .divi_markers
            .iter()
            .any(|marker| document.contains(marker.as_str()));
        let has_wrapper = self
            .config
            .wrapper_markers
            .iter()
            .any(|marker| document.contains(marker.as_str()));
        has_divi_marker && !has_wrapper
    }

    /// Parse `document` into a fresh store instance.
    ///
    /// While the store is rendering inner content the current instance is
    /// reused instead.
    pub fn parse(
        &mut self,
        document: &str,
        store: &mut BlockParserStore,
        host: &dyn Host,
    ) -> Vec<ParsedBlock> {
        if !self.handles(document) {
            debug!("No Divi markers, using the default parser");
            return DefaultBlockParser::with_token_source(self.tokens.clone()).parse(document);
        }

        let layout_type = store.layout_type();
        if host.filter_order_index_reset(self.config.reset_order_index, &layout_type) {
            debug!("Resetting order indexes for {layout_type}");
            store.module_order_mut().reset(&layout_type);
        }

        if store.is_rendering_inner_content() {
            store.use_instance(store.current_instance());
        } else {
            store.new_instance();
        }

        let mut document = document.to_string();
        if self.mode.expands_global_layouts() {
            document = inline_global_layouts(&document, store, host, &self.config);
        }
        if self.mode.is_render() {
            document = expand_loop_blocks(&document, host);
            document = substitute(&document, |name, settings| {
                host.dynamic_content(name, settings)
            });
        }

        self.document = document;
        self.offset = 0;
        self.stack.clear();
        self.output.clear();

        while self.proceed(store) {}

        std::mem::take(&mut self.output)
            .into_iter()
            .filter_map(|output| match output {
                Output::Freeform(html) => Some(ParsedBlock::freeform(html)),
                Output::Block(id) => store.to_parsed_block(id.as_str()),
            })
            .collect()
    }

    /// Parse content rendered from inside another block, such as a post
    /// excerpt, into the current store instance.
    pub fn parse_inner_content(
        &mut self,
        document: &str,
        store: &mut BlockParserStore,
        host: &dyn Host,
    ) -> Vec<ParsedBlock> {
        let previous = store.set_rendering_inner_content(true);
        let blocks = self.parse(document, store, host);
        store.set_rendering_inner_content(previous);
        blocks
    }

    /// Consume one token. Returns `false` once parsing is finished.
    pub fn proceed(&mut self, store: &mut BlockParserStore) -> bool {
        let token = self.tokens.next_token(&self.document, self.offset);
        let depth = self.stack.len();
        let leading_html_start = (token.start > self.offset).then_some(self.offset);
        trace!("{:?} at depth {depth}", token.kind);

        match token.kind {
            TokenType::NoMoreTokens => {
                if depth == 0 {
                    self.add_freeform();
                }
                while !self.stack.is_empty() {
                    self.add_block_from_stack(None, store);
                }
                false
            }
            TokenType::VoidBlock => {
                let id = self.register(&token, store);
                if depth == 0 {
                    if let Some(start) = leading_html_start {
                        let html = self.document[start..token.start].to_string();
                        self.output.push(Output::Freeform(html));
                    }
                    self.output.push(Output::Block(id));
                } else {
                    self.add_inner_block(id, token.start, token.len, None, store);
                }
                self.offset = token.end();
                true
            }
            TokenType::BlockOpener => {
                let id = self.register(&token, store);
                self.stack.push(BlockParserFrame::new(
                    id,
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
                    debug!("Closer without opener at {}", token.start);
                    self.add_freeform();
                    return false;
                }
                if depth == 1 {
                    self.add_block_from_stack(Some(token.start), store);
                    self.offset = token.end();
                    return true;
                }

                let Some(top) = self.stack.pop() else {
                    return false;
                };
                let html = &self.document[top.prev_offset..token.start];
                if let Some(block) = store.get_mut(top.block.as_str()) {
                    block.push_html(html);
                }
                self.add_inner_block(
                    top.block,
                    top.token_start,
                    top.token_length,
                    Some(token.end()),
                    store,
                );
                self.offset = token.end();
                true
            }
            TokenType::Other => {
                self.add_freeform();
                false
            }
        }
    }

    /// Create the block for `token`, parented to the innermost open block.
    fn register(&self, token: &Token, store: &mut BlockParserStore) -> BlockId {
        let name = token.block_name.as_deref().unwrap_or_default();
        let mut block = BlockParserBlock::new(name, token.attrs.clone(), store);
        block.parent_id = Some(
            self.stack
                .last()
                .map(|frame| frame.block.clone())
                .unwrap_or_else(BlockId::root),
        );
        store.insert_unique(block)
    }

    fn add_freeform(&mut self) {
        if self.offset >= self.document.len() {
            return;
        }
        let html = self.document[self.offset..].to_string();
        self.output.push(Output::Freeform(html));
    }

    fn add_inner_block(
        &mut self,
        id: BlockId,
        token_start: usize,
        token_length: usize,
        last_offset: Option<usize>,
        store: &mut BlockParserStore,
    ) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        let html = &self.document[parent.prev_offset..token_start];

        if let Some(child) = store.get_mut(id.as_str()) {
            child.parent_id = Some(parent.block.clone());
        }
        if let Some(block) = store.get_mut(parent.block.as_str()) {
            if !html.is_empty() {
                block.push_html(html);
            }
            block.inner_blocks.push(id);
            block.inner_content.push(None);
        }
        parent.prev_offset = last_offset.unwrap_or(token_start + token_length);
    }

    fn add_block_from_stack(&mut self, end_offset: Option<usize>, store: &mut BlockParserStore) {
        let Some(top) = self.stack.pop() else {
            return;
        };
        let html = match end_offset {
            Some(end) => &self.document[top.prev_offset..end],
            None => &self.document[top.prev_offset..],
        };
        if let Some(block) = store.get_mut(top.block.as_str()) {
            if !html.is_empty() {
                block.push_html(html);
            }
            block.parent_id = Some(BlockId::root());
        }
        if let Some(start) = top.leading_html_start {
            let html = self.document[start..top.token_start].to_string();
            self.output.push(Output::Freeform(html));
        }
        self.output.push(Output::Block(top.block));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use crate::parsing::ROOT_ID;
    use pretty_assertions::assert_eq;

    /// Reports delimiters named `stop` as [`TokenType::Other`].
    #[derive(Debug, Clone)]
    struct StopAt(&'static str);

    impl TokenSource for StopAt {
        fn next_token(&mut self, document: &str, offset: usize) -> Token {
            let mut token = BlockCommentLexer.next_token(document, offset);
            if token.block_name.as_deref() == Some(self.0) {
                token.kind = TokenType::Other;
            }
            token
        }
    }

    fn parse(document: &str) -> (Vec<ParsedBlock>, BlockParserStore) {
        let mut store = BlockParserStore::new();
        let blocks = BlockParser::default().parse(document, &mut store, &NullHost);
        (blocks, store)
    }

    #[test]
    fn void_section_hangs_off_root() {
        let (blocks, store) = parse("<!-- wp:divi/section /-->");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "divi/section");
        let section = store.get("divi/section-0").unwrap();
        assert_eq!(section.parent_id.as_ref().map(BlockId::as_str), Some(ROOT_ID));
    }

    #[test]
    fn closer_without_opener_ends_as_freeform() {
        let (blocks, _) = parse("<!-- wp:divi/text /--><!-- /wp:divi/row -->tail");
        let names: Vec<_> = blocks.iter().map(|b| b.block_name.clone()).collect();
        assert_eq!(names, vec![Some("divi/text".to_string()), None]);
        assert_eq!(blocks[1].inner_html, "<!-- /wp:divi/row -->tail");
    }

    #[test]
    fn unknown_token_ends_as_one_freeform_block() {
        let mut store = BlockParserStore::new();
        let mut parser = BlockParser::with_token_source(ParserConfig::default(), StopAt("divi/odd"));
        let document = "<!-- wp:divi/text /--><p>a</p><!-- wp:divi/odd /--><!-- wp:divi/text /--><p>b</p>";

        let blocks = parser.parse(document, &mut store, &NullHost);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name(), "divi/text");
        assert_eq!(
            blocks[1],
            ParsedBlock::freeform("<p>a</p><!-- wp:divi/odd /--><!-- wp:divi/text /--><p>b</p>")
        );
        assert!(store.get("divi/text-0").is_some());
        assert!(store.get("divi/text-1").is_none());
    }

    #[test]
    fn unterminated_row_keeps_its_column() {
        let (blocks, store) = parse("<!-- wp:divi/row --><!-- wp:divi/column /-->");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].inner_blocks[0].name(), "divi/column");
        assert_eq!(
            store.get_parent("divi/column-0").map(|p| p.id.clone()),
            Some(BlockId::new("divi/row-0"))
        );
    }

    #[test]
    fn every_unterminated_level_is_closed() {
        let (blocks, store) =
            parse("<!-- wp:divi/section --><!-- wp:divi/row --><!-- wp:divi/column --><p>x</p>");

        let names: Vec<_> = blocks.iter().map(ParsedBlock::name).collect();
        assert_eq!(names, vec!["divi/column", "divi/row", "divi/section"]);
        assert_eq!(blocks[0].inner_html, "<p>x</p>");
        assert_eq!(store.get_children(ROOT_ID).len(), 3);
    }

    #[test]
    fn plain_html_is_delegated() {
        let (blocks, store) = parse("<!-- wp:paragraph --><p>x</p><!-- /wp:paragraph -->");
        assert_eq!(blocks[0].name(), "core/paragraph");
        assert!(store.is_empty());
    }

    #[test]
    fn inner_content_reuses_the_instance() {
        let mut store = BlockParserStore::new();
        let mut parser = BlockParser::default();
        parser.parse("<!-- wp:divi/section /-->", &mut store, &NullHost);
        let outer = store.current_instance();

        parser.parse_inner_content("<!-- wp:divi/text /-->", &mut store, &NullHost);

        assert_eq!(store.current_instance(), outer);
        assert!(store.get("divi/section-0").is_some());
        assert!(store.get("divi/text-0").is_some());
        assert!(!store.is_rendering_inner_content());
    }
}
