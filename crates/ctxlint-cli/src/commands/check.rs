// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `ctxlint check`: analyze files and report findings.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rayon::prelude::*;
use tracing::{info, warn};
use walkdir::WalkDir;

use ctxlint_analyzer::{analyze_tree, AnalysisOutcome, CancellationToken, CollectingSink, RuleConfig};
use ctxlint_diagnostics::json::{to_json_report, DiagnosticReport};
use ctxlint_diagnostics::{Diagnostic, Severity, ToDiagnostic};

use super::{read_source, render};
use crate::error::CliError;
use crate::{output, Format};

/// Diagnostics for one analyzed file.
struct FileResult {
    path: String,
    source: String,
    diagnostics: Vec<Diagnostic>,
}

impl FileResult {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }
}

pub fn cmd_check(paths: &[PathBuf], format: Format, deny_warnings: bool) -> Result<ExitCode, CliError> {
    let files = collect_files(paths)?;
    if files.is_empty() {
        return Err(CliError::NoSources);
    }
    info!(files = files.len(), "checking");

    let config = RuleConfig::default();
    let cancel = CancellationToken::new();
    let results = files
        .par_iter()
        .map(|path| check_file(path, &config, &cancel))
        .collect::<Result<Vec<_>, _>>()?;

    let errors: usize = results.iter().map(|r| r.count(Severity::Error)).sum();
    let warnings: usize = results.iter().map(|r| r.count(Severity::Warning)).sum();

    match format {
        Format::Human => print_human(&results, errors, warnings),
        Format::Json => {
            let reports: Vec<DiagnosticReport> = results
                .iter()
                .map(|r| to_json_report(&r.diagnostics, &r.source, &r.path))
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    if errors > 0 || (deny_warnings && warnings > 0) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Expand directories into their `.cs` files. Explicit file arguments are
/// taken as given.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(CliError::Missing(path.display().to_string()));
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|source| CliError::Walk {
                path: path.display().to_string(),
                source,
            })?;
            if entry.file_type().is_file() && is_csharp(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_csharp(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "cs")
}

fn check_file(path: &Path, config: &RuleConfig, cancel: &CancellationToken) -> Result<FileResult, CliError> {
    let source = read_source(path)?;
    let file_name = path.display().to_string();

    let (parsed, lex_errors) = ctxlint_parser::parse_source(&source);
    let mut diagnostics: Vec<Diagnostic> = lex_errors.iter().map(ToDiagnostic::to_diagnostic).collect();
    diagnostics.extend(parsed.errors.iter().map(ToDiagnostic::to_diagnostic));
    if !diagnostics.is_empty() {
        warn!(file = %file_name, errors = diagnostics.len(), "syntax errors; analyzing what parsed");
    }

    let model = ctxlint_semantic::bind(&parsed.tree);
    let sink = CollectingSink::new();
    if let AnalysisOutcome::Cancelled { .. } = analyze_tree(&parsed.tree, &model, config, cancel, &sink) {
        warn!(file = %file_name, "analysis cancelled");
    }
    diagnostics.extend(sink.into_reports().iter().map(ToDiagnostic::to_diagnostic));

    Ok(FileResult {
        path: file_name,
        source,
        diagnostics,
    })
}

fn print_human(results: &[FileResult], errors: usize, warnings: usize) {
    for result in results.iter().filter(|r| !r.diagnostics.is_empty()) {
        println!("{}", render(&result.diagnostics, &result.source, &result.path));
    }

    let checked = output::count(results.len(), "file");
    if errors == 0 && warnings == 0 {
        println!("{}", output::banner_ok(&format!("{checked} clean")));
    } else {
        let summary = format!(
            "{checked}: {}, {}",
            output::count(errors, "error"),
            output::count(warnings, "warning")
        );
        if errors > 0 {
            println!("{}", output::banner_fail(&summary));
        } else {
            println!("{}", output::banner_ok(&summary));
        }
    }
}
