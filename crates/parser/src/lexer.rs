mod token;
use common::Span;
use logos::Logos;
pub use token::{NamesToken, RecordToken};

/// A token produced by [`Lexer`], borrowing its text from the source.
#[derive(Debug, PartialEq, Clone)]
pub struct Token<'a, K> {
    pub kind: K,
    pub text: &'a str,
    pub span: Span,
}

pub struct Lexer<'a, K: Logos<'a>> {
    inner: logos::Lexer<'a, K>,
    offset: usize,
}

impl<'a, K> Lexer<'a, K>
where
    K: Logos<'a, Source = str>,
    K::Extras: Default,
{
    /// Create a new lexer with the given source code string.
    pub fn new(src: &'a str) -> Self {
        Self::with_offset(src, 0)
    }

    /// Create a lexer over a piece of a larger file. Token spans are shifted
    /// by `offset` so they stay relative to the whole file.
    pub fn with_offset(src: &'a str, offset: usize) -> Self {
        Lexer {
            inner: K::lexer(src),
            offset,
        }
    }

    /// Return the full source code string that's being tokenized.
    pub fn source(&self) -> &'a str {
        self.inner.source()
    }
}

impl<'a, K> Iterator for Lexer<'a, K>
where
    K: Logos<'a, Source = str>,
{
    type Item = Token<'a, K>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.inner.next()?;
        let text = self.inner.slice();
        Some(Token {
            kind,
            text,
            span: Span::from(self.inner.span()).shifted(self.offset),
        })
    }
}

/// Strips the quotes off a `Text` token and resolves backslash escapes.
pub fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
