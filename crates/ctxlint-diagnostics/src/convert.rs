// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `ToDiagnostic` for lexer errors, parser errors and rule reports.

use ctxlint_analyzer::{Reason, Report};

use crate::{Diagnostic, Severity, ToDiagnostic};

// ============================================================================
// Lex Errors
// ============================================================================

impl ToDiagnostic for ctxlint_lexer::LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        let (code, label) = if self.message.starts_with("Invalid escape") {
            ("E0002", "unknown escape")
        } else if self.message.starts_with("Invalid number") {
            ("E0003", "not a valid number")
        } else {
            ("E0001", "unexpected character")
        };
        let mut diag = Diagnostic::error(&self.message)
            .with_code(code)
            .with_primary(self.span, label);
        if let Some(hint) = &self.hint {
            diag = diag.with_help(hint.as_str());
        }
        diag
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

impl ToDiagnostic for ctxlint_parser::ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(&self.message)
            .with_code("E0100")
            .with_primary(self.span, "here");
        if let Some(hint) = &self.hint {
            diag = diag.with_help(hint.as_str());
        }
        diag
    }
}

// ============================================================================
// Rule Reports
// ============================================================================

impl ToDiagnostic for Report {
    fn to_diagnostic(&self) -> Diagnostic {
        let severity = match self.severity {
            ctxlint_analyzer::Severity::Error => Severity::Error,
            ctxlint_analyzer::Severity::Warning => Severity::Warning,
            ctxlint_analyzer::Severity::Info => Severity::Note,
        };
        let label = self.message_args.first().cloned().unwrap_or_default();
        Diagnostic::warning(self.message())
            .with_severity(severity)
            .with_code(self.descriptor_id)
            .with_primary(self.span, label)
            .with_note(format!("reason: {}", self.reason))
            .with_help(help_for(self.reason))
    }
}

fn help_for(reason: Reason) -> &'static str {
    match reason {
        Reason::MixedInstance => {
            "use only the context owned by this scope; create another one if the work needs it"
        }
        Reason::UsedOutsideScope => {
            "create and dispose the context inside the concurrent work, e.g. from IDbContextFactory"
        }
        Reason::UnscopedUsage => {
            "create a context per unit of work with IDbContextFactory and dispose it with `using`"
        }
        Reason::ParallelLoopUsage => "create a context inside the loop body for each iteration",
        Reason::UnsafeParallelQuery => "materialize the query (e.g. `ToList()`) before `AsParallel()`",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabelStyle;
    use ctxlint_analyzer::{emit, CollectingSink, ConstructKind, Finding};
    use ctxlint_ast::Span;

    #[test]
    fn report_becomes_warning_with_code() {
        let finding = Finding {
            span: Span::new(20, 23),
            name: "ctx".to_string(),
            owner: None,
            reason: Reason::UnscopedUsage,
            construct: ConstructKind::SpawnSingle,
        };
        let sink = CollectingSink::new();
        emit(&finding, &sink);
        let report = sink.into_reports().remove(0);

        let diag = report.to_diagnostic();
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code.as_ref().map(|c| c.0.as_str()), Some("CTX1001"));
        assert!(diag.message.starts_with("DbContext should not be shared across threads: "));
        assert_eq!(diag.labels[0].style, LabelStyle::Primary);
        assert_eq!(diag.primary_span(), Some(Span::new(20, 23)));
        assert_eq!(diag.notes, vec!["reason: unscoped-usage".to_string()]);
        assert!(diag.help.is_some());
    }

    #[test]
    fn lex_errors_map_to_codes() {
        let result = ctxlint_lexer::Lexer::new("var x = `;").tokenize();
        let diag = result.errors[0].to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.code.map(|c| c.0), Some("E0001".to_string()));
    }

    #[test]
    fn parse_errors_keep_hints() {
        let lex = ctxlint_lexer::Lexer::new("x = 1 }").tokenize();
        let result = ctxlint_parser::Parser::new(lex.tokens).parse();
        let diag = result.errors[0].to_diagnostic();
        assert_eq!(diag.code.map(|c| c.0), Some("E0100".to_string()));
        assert!(diag.help.is_some());
    }
}
