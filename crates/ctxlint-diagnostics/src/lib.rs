// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostics shared by every ctxlint front end.
//!
//! Lexer, parser and rule outputs are converted to one `Diagnostic` type via
//! `ToDiagnostic`, then rendered for a terminal (`formatter`) or as JSON
//! (`json`).

pub mod codes;
pub mod convert;
pub mod formatter;
pub mod json;

use ctxlint_ast::Span;
use serde::Serialize;

// ============================================================================
// Core Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

/// A labeled source span within a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub span: Span,
    pub style: LabelStyle,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A code like `E0100` or `CTX1001`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub String);

// ============================================================================
// Builder API
// ============================================================================

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(ErrorCode(code.into()));
        self
    }

    pub fn with_label(mut self, span: Span, style: LabelStyle, msg: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            style,
            message: Some(msg.into()),
        });
        self
    }

    pub fn with_primary(self, span: Span, msg: impl Into<String>) -> Self {
        self.with_label(span, LabelStyle::Primary, msg)
    }

    pub fn with_secondary(self, span: Span, msg: impl Into<String>) -> Self {
        self.with_label(span, LabelStyle::Secondary, msg)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// First primary label's span, or the first label's.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .or(self.labels.first())
            .map(|l| l.span)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Convert a lexer, parser or rule output into a diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_span_prefers_primary_label() {
        let diag = Diagnostic::warning("shared")
            .with_secondary(Span::new(0, 3), "declared here")
            .with_primary(Span::new(10, 13), "used here");
        assert_eq!(diag.primary_span(), Some(Span::new(10, 13)));
        assert!(!diag.is_error());
        assert_eq!(Diagnostic::error("x").primary_span(), None);
    }
}
