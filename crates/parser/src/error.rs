use common::diagnostics::{Diagnostic, Label};
use common::files::SourceFile;
use common::Span;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The text doesn't follow the file grammar.
    Syntax,
    /// The schema parsed but its decision attribute is unusable.
    SchemaConsistency,
    /// A tree names an attribute or value the schema doesn't have.
    UnresolvedReference,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::SchemaConsistency => "inconsistent schema",
            ParseErrorKind::UnresolvedReference => "unresolved reference",
        })
    }
}

/// A failed load. Nothing that was built before the failure is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} on line {line}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Text of the primary label when rendered as a diagnostic.
    pub label: String,
    pub span: Span,
    /// One-based line of `span.start`.
    pub line: usize,
    /// Another place in the file the error refers to, with its label.
    pub related: Option<(Span, String)>,
}

impl ParseError {
    pub(crate) fn new(
        kind: ParseErrorKind,
        file: &SourceFile,
        span: Span,
        message: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            label: label.into(),
            span,
            line: file.line_number(span.start),
            related: None,
        }
    }

    pub(crate) fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related = Some((span, label.into()));
        self
    }

    pub(crate) fn syntax(
        file: &SourceFile,
        span: Span,
        message: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self::new(ParseErrorKind::Syntax, file, span, message, label)
    }

    /// A syntax error at the end of input. After a final newline that's the
    /// empty line following it.
    pub(crate) fn end_of_file(file: &SourceFile, expected: &str) -> Self {
        let end = file.content().len();
        Self::syntax(
            file,
            Span::new(end, end),
            format!("unexpected end of file, expected {expected}"),
            format!("expected {expected}"),
        )
    }

    pub(crate) fn unresolved(
        file: &SourceFile,
        span: Span,
        message: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self::new(ParseErrorKind::UnresolvedReference, file, span, message, label)
    }

    pub fn diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(format!("{}: {}", self.kind, self.message))
            .with_label(Label::primary(self.span, self.label.clone()));
        match &self.related {
            Some((span, label)) => diag.with_label(Label::secondary(*span, label.clone())),
            None => diag,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
