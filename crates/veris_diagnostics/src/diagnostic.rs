//! Structured diagnostic messages with severity, codes, labels, and notes.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use veris_source::Span;

/// A structured diagnostic message with source locations, labels, and notes.
///
/// Diagnostics are the primary mechanism for reporting errors and warnings
/// to the user. Each diagnostic includes a severity level, a stable code, a
/// primary message and source span, plus optional secondary labels and
/// explanatory notes. Formatting is left to embedding tools.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The stable code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The primary source span where the issue was detected.
    pub primary_span: Span,
    /// Additional annotated source spans providing context.
    pub labels: Vec<Label>,
    /// Explanatory footnotes (e.g., "previously defined here").
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code, message, and
    /// span.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic with the given code, message, and
    /// span.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Adds a label to this diagnostic.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let diag = Diagnostic::error(code, "unexpected token", Span::DUMMY);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "unexpected token");
        assert_eq!(format!("{}", diag.code), "E101");
    }

    #[test]
    fn create_warning() {
        let code = DiagnosticCode::new(Category::Warning, 201);
        let diag = Diagnostic::warning(code, "duplicate case match", Span::DUMMY);
        assert_eq!(diag.severity, Severity::Warning);
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let diag = Diagnostic::error(code, "type mismatch", Span::DUMMY)
            .with_label(Label::secondary(Span::DUMMY, "declared here"))
            .with_note("types must be equivalent");
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Error, 7);
        let diag = Diagnostic::error(code, "boom", Span::DUMMY);
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, "boom");
        assert_eq!(back.code, code);
    }
}
