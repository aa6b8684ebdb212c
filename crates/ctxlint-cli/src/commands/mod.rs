// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Subcommand implementations.

pub mod check;
pub mod explain;
pub mod inspect;

use std::fs;
use std::path::Path;

use ctxlint_diagnostics::formatter::DiagnosticFormatter;
use ctxlint_diagnostics::Diagnostic;

use crate::error::CliError;

pub(crate) fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Render diagnostics for a terminal.
pub(crate) fn render(diagnostics: &[Diagnostic], source: &str, file: &str) -> String {
    let formatter = DiagnosticFormatter::new(source).with_file_name(file);
    diagnostics
        .iter()
        .map(|d| formatter.format(d))
        .collect::<Vec<_>>()
        .join("\n")
}
