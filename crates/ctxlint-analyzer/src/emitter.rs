// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Turning findings into reports for a host sink.

use std::sync::{Mutex, PoisonError};

use ctxlint_ast::Span;
use serde::Serialize;

use crate::finding::{Finding, Reason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Static description of a rule's diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
    /// Message template with one `{0}` placeholder.
    pub message_format: &'static str,
}

impl RuleDescriptor {
    pub fn format(&self, arg: &str) -> String {
        self.message_format.replace("{0}", arg)
    }
}

/// The one diagnostic this rule publishes.
pub const CTX1001: RuleDescriptor = RuleDescriptor {
    id: "CTX1001",
    title: "DbContext should not be shared across threads",
    category: "Design",
    default_severity: Severity::Warning,
    message_format: "DbContext should not be shared across threads: {0}",
};

/// A diagnostic as handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub descriptor_id: &'static str,
    pub severity: Severity,
    pub message_args: Vec<String>,
    pub span: Span,
    pub reason: Reason,
}

impl Report {
    pub fn message(&self) -> String {
        CTX1001.format(self.message_args.first().map(String::as_str).unwrap_or_default())
    }
}

/// Receives reports, possibly from several analysis threads at once.
pub trait DiagnosticSink: Sync {
    fn report(&self, report: Report);
}

/// A sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<Report>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, sorted by position.
    pub fn into_reports(self) -> Vec<Report> {
        let mut reports = self.reports.into_inner().unwrap_or_else(PoisonError::into_inner);
        reports.sort_by_key(|r| (r.span, r.reason));
        reports
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, report: Report) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }
}

/// Report one finding under `CTX1001`.
pub fn emit(finding: &Finding, sink: &dyn DiagnosticSink) {
    sink.report(Report {
        descriptor_id: CTX1001.id,
        severity: CTX1001.default_severity,
        message_args: vec![finding.phrase()],
        span: finding.span,
        reason: finding.reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConstructKind;

    #[test]
    fn emit_formats_message_from_phrase() {
        let finding = Finding {
            span: Span::new(4, 7),
            name: "ctx".to_string(),
            owner: None,
            reason: Reason::ParallelLoopUsage,
            construct: ConstructKind::ParallelLoop,
        };
        let sink = CollectingSink::new();
        emit(&finding, &sink);
        assert_eq!(sink.len(), 1);

        let reports = sink.into_reports();
        assert_eq!(reports[0].descriptor_id, "CTX1001");
        assert_eq!(reports[0].severity, Severity::Warning);
        assert_eq!(reports[0].span, Span::new(4, 7));
        assert_eq!(
            reports[0].message(),
            "DbContext should not be shared across threads: 'ctx' is shared across parallel loop iterations"
        );
    }

    #[test]
    fn sink_accepts_reports_from_many_threads() {
        let sink = CollectingSink::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let sink = &sink;
                s.spawn(move || {
                    sink.report(Report {
                        descriptor_id: CTX1001.id,
                        severity: Severity::Warning,
                        message_args: vec![format!("r{i}")],
                        span: Span::new(i, i + 1),
                        reason: Reason::UnscopedUsage,
                    })
                });
            }
        });
        let reports = sink.into_reports();
        assert_eq!(reports.len(), 8);
        assert!(reports.windows(2).all(|w| w[0].span <= w[1].span));
    }

    #[test]
    fn descriptor_metadata() {
        assert_eq!(CTX1001.category, "Design");
        assert_eq!(CTX1001.format("x"), "DbContext should not be shared across threads: x");
    }
}
