//! # divi-blocks-syntax
//!
//! Tokenizer for WordPress block-comment syntax, as used by Divi 5 content.
//!
//! ## What is Being Tokenized?
//!
//! Block content is HTML with structure encoded in comments:
//!
//! ```text
//! <!-- wp:divi/section {"module":{"meta":{}}} -->
//!   <!-- wp:divi/row -->
//!     <!-- wp:divi/text {"content":{}} /-->
//!   <!-- /wp:divi/row -->
//! <!-- /wp:divi/section -->
//! ```
//!
//! Everything outside a delimiter is opaque HTML. This crate only finds the
//! delimiters; building a tree from them is the engine's job.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Lexemes → TokenSource → Token
//!               (Logos)                         (type, name, attrs, offsets)
//! ```
//!
//! - [`lexer`] splits text into text runs and [`lexer::Delimiter`]s.
//! - [`token`] decodes delimiter attributes and exposes the
//!   [`TokenSource`] trait the block parser consumes.
//!
//! ## Quick Start
//!
//! ```
//! use divi_blocks_syntax::{BlockCommentLexer, TokenSource, TokenType};
//!
//! let doc = "<!-- wp:divi/section /-->";
//! let token = BlockCommentLexer.next_token(doc, 0);
//!
//! assert_eq!(token.kind, TokenType::VoidBlock);
//! assert_eq!(token.block_name.as_deref(), Some("divi/section"));
//! ```

pub mod lexer;
pub mod token;

pub use token::{BlockCommentLexer, Token, TokenSource, TokenType, lex_delimiters};
