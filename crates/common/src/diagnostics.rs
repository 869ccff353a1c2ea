use crate::files::{FileStore, SourceFileId};
use crate::Span;
use codespan_reporting::diagnostic as cs;
use codespan_reporting::term;
pub use cs::Severity;
use term::termcolor::{BufferWriter, ColorChoice};

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            labels: vec![],
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn into_cs(self, file_id: SourceFileId) -> cs::Diagnostic<SourceFileId> {
        cs::Diagnostic {
            severity: self.severity,
            code: None,
            message: self.message,
            labels: self
                .labels
                .into_iter()
                .map(|label| label.into_cs_label(file_id))
                .collect(),
            notes: vec![],
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

impl From<LabelStyle> for cs::LabelStyle {
    fn from(style: LabelStyle) -> Self {
        match style {
            LabelStyle::Primary => cs::LabelStyle::Primary,
            LabelStyle::Secondary => cs::LabelStyle::Secondary,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Label {
    pub style: LabelStyle,
    pub span: Span,
    pub message: String,
}

impl Label {
    /// Create a primary label with the given message. This will underline the
    /// given span with carets (`^^^^`).
    pub fn primary<S: Into<String>>(span: Span, message: S) -> Self {
        Label {
            style: LabelStyle::Primary,
            span,
            message: message.into(),
        }
    }

    /// Create a secondary label with the given message. This will underline the
    /// given span with hyphens (`----`).
    pub fn secondary<S: Into<String>>(span: Span, message: S) -> Self {
        Label {
            style: LabelStyle::Secondary,
            span,
            message: message.into(),
        }
    }

    /// Convert into a [`codespan_reporting::diagnostic::Label`]
    pub fn into_cs_label(self, file_id: SourceFileId) -> cs::Label<SourceFileId> {
        cs::Label {
            style: self.style.into(),
            file_id,
            range: self.span.into(),
            message: self.message,
        }
    }
}

/// Print the given diagnostics to stderr.
pub fn print_diagnostics(diagnostics: &[(SourceFileId, Diagnostic)], files: &FileStore) {
    let writer = BufferWriter::stderr(ColorChoice::Auto);
    let mut buffer = writer.buffer();
    emit_all(&mut buffer, diagnostics, files);
    // If we use `writer` here, the output won't be captured by rust's test system.
    eprint!("{}", String::from_utf8_lossy(buffer.as_slice()));
}

/// Format the given diagnostics as a string.
pub fn diagnostics_string(diagnostics: &[(SourceFileId, Diagnostic)], files: &FileStore) -> String {
    let writer = BufferWriter::stderr(ColorChoice::Never);
    let mut buffer = writer.buffer();
    emit_all(&mut buffer, diagnostics, files);
    String::from_utf8_lossy(buffer.as_slice()).into_owned()
}

fn emit_all(
    buffer: &mut term::termcolor::Buffer,
    diagnostics: &[(SourceFileId, Diagnostic)],
    files: &FileStore,
) {
    let config = term::Config::default();
    for (file_id, diag) in diagnostics {
        let diag = diag.clone().into_cs(*file_id);
        if let Err(err) = term::emit(buffer, &config, files, &diag) {
            // Only happens when a label points outside of its file; fall back
            // to the bare message so the error isn't swallowed.
            use std::io::Write;
            let _ = writeln!(buffer, "error: {}\n  ({err})", diag.message);
        }
    }
}
