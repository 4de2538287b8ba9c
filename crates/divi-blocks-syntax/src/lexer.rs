//! # Lexer - Finding Block Delimiters
//!
//! This module breaks block content into text runs and block-comment
//! delimiters using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Delimiter Grammar
//!
//! A delimiter is an HTML comment of one of three shapes:
//!
//! ```text
//! <!-- wp:divi/section {"module":{}} -->     opener
//! <!-- /wp:divi/section -->                  closer
//! <!-- wp:divi/text {"content":{}} /-->      void (self-closing)
//! ```
//!
//! Logos only recognises the `<!--` prefix; the [`scan_delimiter`] callback
//! then matches the rest of the delimiter by hand, because the attribute JSON
//! needs a rule no regular expression in Logos can express: the JSON ends at
//! the *first* `}` that is followed by whitespace and `/-->` or `-->`.
//!
//! A `<!--` that does not start a delimiter comes back as a lexer error and
//! is treated as plain text, so every byte of the input still lands in
//! exactly one lexeme.
//!
//! ## Public API
//!
//! - [`lex`] - Split input into [`Lexeme`]s with byte spans
//! - [`Delimiter`] - A recognised delimiter before its attributes are decoded

use std::ops::Range;

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!--` followed by a complete block delimiter.
    #[token("<!--", scan_delimiter)]
    Delimiter(Delimiter),

    /// A run of anything that cannot start a comment.
    #[regex(r"[^<]+")]
    Text,

    /// A `<` that does not start a comment.
    #[token("<")]
    Lt,
}

/// A block delimiter as it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    /// `true` for `<!-- /wp:... -->`.
    pub closer: bool,
    /// `true` for `<!-- wp:... /-->`.
    pub void: bool,
    /// Fully qualified block name; a missing namespace means `core/`.
    pub name: String,
    /// Raw attribute JSON, braces included.
    pub attrs: Option<String>,
}

/// One lexeme of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme<'a> {
    Text(&'a str),
    Delimiter(Delimiter),
}

/// Lex the input into text runs and delimiters with their byte spans.
///
/// Consecutive text pieces are coalesced, so delimiters are always separated
/// by at most one `Text` lexeme.
pub fn lex(input: &str) -> Vec<(Lexeme<'_>, Range<usize>)> {
    let mut out: Vec<(Lexeme<'_>, Range<usize>)> = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(TokenKind::Delimiter(delimiter)) => {
                out.push((Lexeme::Delimiter(delimiter), span));
            }
            // Text, a lone `<`, or a `<!--` that is not a delimiter.
            Ok(TokenKind::Text) | Ok(TokenKind::Lt) | Err(()) => match out.last_mut() {
                Some((Lexeme::Text(text), prev)) if prev.end == span.start => {
                    prev.end = span.end;
                    *text = &input[prev.clone()];
                }
                _ => out.push((Lexeme::Text(&input[span.clone()]), span)),
            },
        }
    }

    out
}

fn scan_delimiter(lex: &mut logos::Lexer<TokenKind>) -> Option<Delimiter> {
    let (delimiter, consumed) = match_delimiter(lex.remainder())?;
    lex.bump(consumed);
    Some(delimiter)
}

/// Match the part of a delimiter after `<!--`, returning the delimiter and
/// the number of bytes consumed.
pub(crate) fn match_delimiter(rest: &str) -> Option<(Delimiter, usize)> {
    let bytes = rest.as_bytes();

    let mut pos = skip_whitespace(bytes, 0);
    if pos == 0 {
        return None;
    }

    let closer = bytes.get(pos) == Some(&b'/');
    if closer {
        pos += 1;
    }

    if !rest[pos..].starts_with("wp:") {
        return None;
    }
    pos += 3;

    let first_end = scan_name(bytes, pos)?;
    let (name, name_end) = match bytes.get(first_end) {
        Some(b'/') => {
            let second_end = scan_name(bytes, first_end + 1)?;
            (rest[pos..second_end].to_string(), second_end)
        }
        _ => (format!("core/{}", &rest[pos..first_end]), first_end),
    };

    pos = skip_whitespace(bytes, name_end);
    if pos == name_end {
        return None;
    }

    let mut attrs = None;
    if bytes.get(pos) == Some(&b'{') {
        let close = find_attrs_end(bytes, pos)?;
        attrs = Some(rest[pos..=close].to_string());
        pos = skip_whitespace(bytes, close + 1);
    }

    let void = bytes.get(pos) == Some(&b'/');
    if void {
        pos += 1;
    }

    if !rest[pos..].starts_with("-->") {
        return None;
    }
    pos += 3;

    Some((
        Delimiter {
            closer,
            void,
            name,
            attrs,
        },
        pos,
    ))
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

/// `[a-z][a-z0-9_-]*`
fn scan_name(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start).is_some_and(u8::is_ascii_lowercase) {
        return None;
    }
    let mut pos = start + 1;
    while bytes
        .get(pos)
        .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'_' || *b == b'-')
    {
        pos += 1;
    }
    Some(pos)
}

/// Index of the first `}` after `open` that is followed by `\s+/?-->`.
fn find_attrs_end(bytes: &[u8], open: usize) -> Option<usize> {
    (open + 1..bytes.len()).find(|&i| bytes[i] == b'}' && closes_delimiter(bytes, i + 1))
}

fn closes_delimiter(bytes: &[u8], from: usize) -> bool {
    let mut pos = skip_whitespace(bytes, from);
    if pos == from {
        return false;
    }
    if bytes.get(pos) == Some(&b'/') {
        pos += 1;
    }
    bytes[pos.min(bytes.len())..].starts_with(b"-->")
}
