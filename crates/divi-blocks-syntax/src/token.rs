//! # Tokens - What the Parser Consumes
//!
//! The block parser never looks at raw delimiter text. It asks a
//! [`TokenSource`] for the next token at an offset and receives a
//! [`Token`]: the token type, the block name, the decoded attributes and the
//! byte range of the delimiter.
//!
//! [`BlockCommentLexer`] is the default source. Hosts with their own
//! tokenizer implement [`TokenSource`] instead.

use log::{trace, warn};
use logos::Logos;
use serde_json::{Map, Value};

use crate::lexer::{Delimiter, TokenKind};

/// The kind of delimiter found at the current offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    NoMoreTokens,
    VoidBlock,
    BlockOpener,
    BlockCloser,
    /// Anything a host tokenizer reports that is none of the above.
    Other,
}

/// A block delimiter token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenType,
    pub block_name: Option<String>,
    pub attrs: Map<String, Value>,
    /// Byte offset of the delimiter in the document.
    pub start: usize,
    /// Byte length of the delimiter.
    pub len: usize,
}

impl Token {
    pub fn no_more_tokens() -> Self {
        Self {
            kind: TokenType::NoMoreTokens,
            block_name: None,
            attrs: Map::new(),
            start: 0,
            len: 0,
        }
    }

    /// Offset just past the delimiter.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    fn from_delimiter(delimiter: Delimiter, start: usize, len: usize) -> Self {
        let kind = if delimiter.void {
            TokenType::VoidBlock
        } else if delimiter.closer {
            TokenType::BlockCloser
        } else {
            TokenType::BlockOpener
        };

        // Closers carry no attributes even when the source has some.
        let attrs = match (&kind, delimiter.attrs) {
            (TokenType::BlockCloser, _) | (_, None) => Map::new(),
            (_, Some(raw)) => decode_attrs(&delimiter.name, &raw),
        };

        Self {
            kind,
            block_name: Some(delimiter.name),
            attrs,
            start,
            len,
        }
    }
}

fn decode_attrs(block_name: &str, raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(attrs) => attrs,
        Err(e) => {
            warn!("Invalid attribute JSON on {block_name}: {e}");
            Map::new()
        }
    }
}

/// Supplies block delimiter tokens to the parser.
pub trait TokenSource {
    /// Find the next delimiter at or after `offset`.
    fn next_token(&mut self, document: &str, offset: usize) -> Token;
}

/// Default [`TokenSource`] backed by the Logos lexer.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockCommentLexer;

impl TokenSource for BlockCommentLexer {
    fn next_token(&mut self, document: &str, offset: usize) -> Token {
        let Some(rest) = document.get(offset..) else {
            return Token::no_more_tokens();
        };

        let mut lexer = TokenKind::lexer(rest);
        while let Some(result) = lexer.next() {
            if let Ok(TokenKind::Delimiter(delimiter)) = result {
                let span = lexer.span();
                let token = Token::from_delimiter(delimiter, offset + span.start, span.len());
                trace!(
                    "{:?} {:?} at {}",
                    token.kind,
                    token.block_name,
                    token.start
                );
                return token;
            }
        }

        Token::no_more_tokens()
    }
}

/// Collect every delimiter token in `document`, in order.
pub fn lex_delimiters(document: &str) -> Vec<Token> {
    let mut source = BlockCommentLexer;
    let mut tokens = Vec::new();
    let mut offset = 0;

    loop {
        let token = source.next_token(document, offset);
        if token.kind == TokenType::NoMoreTokens {
            break;
        }
        offset = token.end();
        tokens.push(token);
    }

    tokens
}
