// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Phase dumps: `lex`, `parse` and `symbols`.

use std::path::Path;
use std::process::ExitCode;

use ctxlint_ast::LineMap;
use ctxlint_diagnostics::{Diagnostic, ToDiagnostic};
use ctxlint_semantic::BoundModel;

use super::{read_source, render};
use crate::error::CliError;
use crate::output;

pub fn cmd_lex(path: &Path) -> Result<ExitCode, CliError> {
    let source = read_source(path)?;
    let result = ctxlint_lexer::Lexer::new(&source).tokenize();
    let lines = LineMap::new(&source);

    for token in &result.tokens {
        let (line, col) = lines.offset_to_line_col(token.span.start);
        println!("{:>4}:{:<3} {:?}", line, col, token.kind);
    }

    let diags: Vec<Diagnostic> = result.errors.iter().map(ToDiagnostic::to_diagnostic).collect();
    Ok(finish(&diags, &source, path, result.tokens.len(), "token"))
}

pub fn cmd_parse(path: &Path) -> Result<ExitCode, CliError> {
    let source = read_source(path)?;
    let (parsed, lex_errors) = ctxlint_parser::parse_source(&source);

    if let Some(root) = parsed.tree.root() {
        print!("{}", parsed.tree.dump(root));
    }

    let mut diags: Vec<Diagnostic> = lex_errors.iter().map(ToDiagnostic::to_diagnostic).collect();
    diags.extend(parsed.errors.iter().map(ToDiagnostic::to_diagnostic));
    Ok(finish(&diags, &source, path, parsed.tree.len(), "node"))
}

pub fn cmd_symbols(path: &Path) -> Result<ExitCode, CliError> {
    let source = read_source(path)?;
    let (parsed, lex_errors) = ctxlint_parser::parse_source(&source);
    let model = ctxlint_semantic::bind(&parsed.tree);
    let lines = LineMap::new(&source);

    let resolved = model.resolutions();
    for (node, symbol) in &resolved {
        let (line, col) = lines.offset_to_line_col(parsed.tree.span(*node).start);
        println!(
            "{:>4}:{:<3} {:<24} {:<18} {}",
            line,
            col,
            symbol.name,
            symbol.kind_name(),
            type_label(&model, symbol)
        );
    }

    let mut diags: Vec<Diagnostic> = lex_errors.iter().map(ToDiagnostic::to_diagnostic).collect();
    diags.extend(parsed.errors.iter().map(ToDiagnostic::to_diagnostic));
    Ok(finish(&diags, &source, path, resolved.len(), "reference"))
}

fn type_label(model: &BoundModel, symbol: &ctxlint_semantic::Symbol) -> String {
    match &symbol.ty {
        Some(ty) => model.display_type(ty),
        None => output::dimmed("?").to_string(),
    }
}

/// Print syntax diagnostics after a dump and pick the exit code.
fn finish(diags: &[Diagnostic], source: &str, path: &Path, items: usize, noun: &str) -> ExitCode {
    let file = path.display().to_string();
    if diags.is_empty() {
        println!("{}", output::banner_ok(&format!("{} in {}", output::count(items, noun), file)));
        return ExitCode::SUCCESS;
    }
    eprintln!("{}", render(diags, source, &file));
    println!(
        "{}",
        output::banner_fail(&format!("{} in {}", output::count(diags.len(), "error"), file))
    );
    ExitCode::FAILURE
}
