// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Running the rule over a whole tree.

use ctxlint_ast::{NodeId, NodeKind, SyntaxTree};
use ctxlint_semantic::SemanticModel;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::cancel::CancellationToken;
use crate::config::RuleConfig;
use crate::detector::analyze_invocation;
use crate::emitter::{emit, DiagnosticSink};
use crate::finding::Finding;
use crate::RuleContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Every invocation was visited.
    Completed { reported: usize },
    /// Cancellation was observed; some nodes may have been skipped.
    Cancelled { reported: usize },
}

impl AnalysisOutcome {
    pub fn reported(self) -> usize {
        match self {
            AnalysisOutcome::Completed { reported } | AnalysisOutcome::Cancelled { reported } => reported,
        }
    }
}

fn invocations(tree: &SyntaxTree) -> Vec<NodeId> {
    tree.iter()
        .filter(|(_, n)| matches!(n.kind, NodeKind::Invocation))
        .map(|(id, _)| id)
        .collect()
}

/// Analyze every invocation in `tree` in parallel, reporting to `sink`.
pub fn analyze_tree(
    tree: &SyntaxTree,
    model: &dyn SemanticModel,
    config: &RuleConfig,
    cancel: &CancellationToken,
    sink: &dyn DiagnosticSink,
) -> AnalysisOutcome {
    if cancel.is_cancelled() {
        return AnalysisOutcome::Cancelled { reported: 0 };
    }
    let cx = RuleContext::new(tree, model, config);
    let nodes = invocations(tree);
    debug!(invocations = nodes.len(), "analyzing tree");

    let reported: usize = nodes
        .par_iter()
        .map(|&node| {
            if cancel.is_cancelled() {
                return 0;
            }
            let findings = analyze_invocation(cx, node);
            for finding in &findings {
                trace!(
                    name = %finding.name,
                    reason = %finding.reason,
                    start = finding.span.start,
                    "finding"
                );
                emit(finding, sink);
            }
            findings.len()
        })
        .sum();

    if cancel.is_cancelled() {
        AnalysisOutcome::Cancelled { reported }
    } else {
        AnalysisOutcome::Completed { reported }
    }
}

/// All findings in `tree`, sorted by position.
pub fn collect_findings(tree: &SyntaxTree, model: &dyn SemanticModel, config: &RuleConfig) -> Vec<Finding> {
    let cx = RuleContext::new(tree, model, config);
    let mut findings: Vec<Finding> = invocations(tree)
        .par_iter()
        .flat_map_iter(|&node| analyze_invocation(cx, node))
        .collect();
    findings.sort_by_key(|f| (f.span, f.reason));
    findings
}
