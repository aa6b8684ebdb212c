// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output (`--format json`).

use ctxlint_ast::{LineMap, Span};
use serde::Serialize;

use crate::codes::ErrorCodeRegistry;
use crate::{Diagnostic, LabelStyle, Severity};

/// All diagnostics for one file.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version.
    pub version: u32,
    pub file: String,
    /// No errors (warnings allowed).
    pub success: bool,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// 1-based line and column of a primary span.
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
    pub source_line: String,
}

#[derive(Debug, Serialize)]
pub struct JsonLabel {
    pub role: LabelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start: LineCol,
    pub end: LineCol,
}

#[derive(Debug, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, file: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let line_map = LineMap::new(source);
    let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let error_count = count(Severity::Error);

    DiagnosticReport {
        version: 1,
        file: file.to_string(),
        success: error_count == 0,
        diagnostics: diagnostics
            .iter()
            .map(|d| to_json_diagnostic(d, source, &line_map, &registry))
            .collect(),
        error_count,
        warning_count: count(Severity::Warning),
    }
}

fn to_json_diagnostic(
    diag: &Diagnostic,
    source: &str,
    line_map: &LineMap,
    registry: &ErrorCodeRegistry,
) -> JsonDiagnostic {
    let code = diag.code.as_ref().map(|c| c.0.clone());
    let category = code
        .as_deref()
        .and_then(|c| registry.get(c))
        .map(|info| info.category.to_string());

    let line_col = |offset: usize| {
        let (line, column) = line_map.offset_to_line_col(offset);
        LineCol {
            line,
            column,
            byte_offset: offset,
        }
    };

    let location = diag.primary_span().map(|span: Span| {
        let start = line_col(span.start);
        SourceLocation {
            source_line: line_map.line_text(source, start.line).unwrap_or("").to_string(),
            line: start.line,
            column: start.column,
            byte_offset: start.byte_offset,
        }
    });

    let labels = diag
        .labels
        .iter()
        .map(|l| JsonLabel {
            role: l.style,
            message: l.message.clone(),
            start: line_col(l.span.start),
            end: line_col(l.span.end),
        })
        .collect();

    JsonDiagnostic {
        severity: diag.severity,
        code,
        category,
        message: diag.message.clone(),
        location,
        labels,
        notes: diag.notes.clone(),
        help: diag.help.clone(),
    }
}

/// Pretty JSON for one report.
pub fn to_json_string(report: &DiagnosticReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
