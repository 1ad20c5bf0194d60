//! Rust source fragments for generated migration scripts.

use std::str::FromStr;

use proc_macro2::{Delimiter, TokenStream, TokenTree};

use crate::{Error, Result};

/// A Rust string literal spelling `s`.
pub(crate) fn string_literal(s: &str) -> String {
    format!("{s:?}")
}

/// Undo the escapes `string_literal` can produce.
fn unescape_rust_string_escapes(value: &str) -> std::result::Result<String, String> {
    if !value.contains('\\') {
        return Ok(value.to_string());
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err("expected `{` after `\\u`".to_string());
                }
                let mut hex = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) if c.is_ascii_hexdigit() && hex.len() < 6 => hex.push(c),
                        _ => return Err("malformed unicode escape".to_string()),
                    }
                }
                let c = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid unicode escape `\\u{{{hex}}}`"))?;
                out.push(c);
            }
            Some(other) => return Err(format!("unknown escape `\\{other}`")),
            None => return Err("dangling backslash".to_string()),
        }
    }

    Ok(out)
}

/// Walks the tokens of one rendered line.
///
/// Lexing is left to `proc-macro2`, so whitespace and string literal
/// boundaries follow Rust's own rules.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    tokens: std::iter::Peekable<proc_macro2::token_stream::IntoIter>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Result<Self> {
        let stream = TokenStream::from_str(input).map_err(|e| Error::Parse {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::over(input, stream))
    }

    fn over(input: &'a str, stream: TokenStream) -> Self {
        Self {
            input,
            tokens: stream.into_iter().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::Parse {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    /// Consume the identifier `name` if it comes next.
    pub(crate) fn eat_ident(&mut self, name: &str) -> bool {
        if let Some(TokenTree::Ident(ident)) = self.tokens.peek()
            && ident == name
        {
            self.tokens.next();
            return true;
        }
        false
    }

    /// Consume the identifier `name` or fail.
    pub(crate) fn ident(&mut self, name: &str) -> Result<()> {
        if self.eat_ident(name) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{name}`")))
        }
    }

    /// Consume any identifier and return it.
    pub(crate) fn any_ident(&mut self) -> Result<String> {
        match self.tokens.next() {
            Some(TokenTree::Ident(ident)) => Ok(ident.to_string()),
            _ => Err(self.error("expected an identifier")),
        }
    }

    /// Consume the punctuation `ch` if it comes next.
    pub(crate) fn eat_punct(&mut self, ch: char) -> bool {
        if let Some(TokenTree::Punct(punct)) = self.tokens.peek()
            && punct.as_char() == ch
        {
            self.tokens.next();
            return true;
        }
        false
    }

    /// Consume the punctuation `ch` or fail.
    pub(crate) fn punct(&mut self, ch: char) -> Result<()> {
        if self.eat_punct(ch) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{ch}`")))
        }
    }

    /// Enter a parenthesized group, returning a cursor over its contents.
    pub(crate) fn parens(&mut self) -> Result<Cursor<'a>> {
        match self.tokens.next() {
            Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Parenthesis => {
                Ok(Cursor::over(self.input, group.stream()))
            }
            _ => Err(self.error("expected `(`")),
        }
    }

    /// Consume a plain string literal and return its value.
    pub(crate) fn string_literal(&mut self) -> Result<String> {
        let Some(TokenTree::Literal(lit)) = self.tokens.next() else {
            return Err(self.error("expected a string literal"));
        };
        let repr = lit.to_string();
        let body = repr
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .ok_or_else(|| self.error(format!("expected a string literal, found `{repr}`")))?;
        unescape_rust_string_escapes(body).map_err(|e| self.error(e))
    }

    /// Fail unless every token was consumed.
    pub(crate) fn finish(&mut self) -> Result<()> {
        match self.tokens.next() {
            None => Ok(()),
            Some(tt) => Err(self.error(format!("unexpected trailing input `{tt}`"))),
        }
    }
}
