// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Detection of DbContext instances shared across concurrent work.
//!
//! The rule runs once per invocation node. A call is first classified as a
//! concurrency construct (spawn, parallel loop, wait-all, parallel query);
//! every Resource-typed reference inside its deferred work is then checked
//! against the disposal regions that enclose it.
//!
//! Nothing here mutates shared state, so invocations can be analyzed in any
//! order and on any thread. See `driver::analyze_tree`.

pub mod cancel;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod driver;
pub mod emitter;
pub mod finding;
pub mod matcher;
pub mod scope;

pub use cancel::CancellationToken;
pub use classifier::{classify, Construct};
pub use config::{
    ConfigError, ConstructDescriptor, ConstructKind, RuleConfig, TypeDescriptor, TypeMatch, WorkArgs,
};
pub use detector::analyze_invocation;
pub use driver::{analyze_tree, collect_findings, AnalysisOutcome};
pub use emitter::{emit, CollectingSink, DiagnosticSink, Report, RuleDescriptor, Severity, CTX1001};
pub use finding::{Finding, Reason};
pub use scope::{DisposalRegion, RegionKind};

use ctxlint_ast::SyntaxTree;
use ctxlint_semantic::SemanticModel;

/// Everything one analysis call reads. Cheap to copy, shared across threads.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub tree: &'a SyntaxTree,
    pub model: &'a dyn SemanticModel,
    pub config: &'a RuleConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(tree: &'a SyntaxTree, model: &'a dyn SemanticModel, config: &'a RuleConfig) -> Self {
        Self { tree, model, config }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use ctxlint_ast::{NodeId, NodeKind, SyntaxTree};
    use ctxlint_semantic::BoundModel;

    use crate::{RuleConfig, RuleContext};

    pub struct Fixture {
        pub tree: SyntaxTree,
        pub model: BoundModel,
        pub config: RuleConfig,
    }

    impl Fixture {
        pub fn cx(&self) -> RuleContext<'_> {
            RuleContext::new(&self.tree, &self.model, &self.config)
        }
    }

    /// Parse and bind `src`, failing the test on syntax errors.
    pub fn fixture(src: &str) -> Fixture {
        let (result, lex_errors) = ctxlint_parser::parse_source(src);
        assert!(lex_errors.is_empty(), "{:?}", lex_errors);
        assert!(result.is_ok(), "{:?}", result.errors);
        let model = ctxlint_semantic::bind(&result.tree);
        Fixture {
            tree: result.tree,
            model,
            config: RuleConfig::default(),
        }
    }

    /// First invocation whose callee is named `member`.
    pub fn invocation_named(tree: &SyntaxTree, member: &str) -> NodeId {
        tree.iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Invocation))
            .map(|(id, _)| id)
            .find(|&id| {
                tree.invocation_callee(id)
                    .and_then(|c| tree.name_of(tree.unparen(c)))
                    == Some(member)
            })
            .unwrap_or_else(|| panic!("no call to {member}"))
    }

    /// Identifier and member-access nodes named `name`, in source order.
    pub fn refs_named(tree: &SyntaxTree, name: &str) -> Vec<NodeId> {
        let mut refs: Vec<NodeId> = tree
            .iter()
            .filter(|(id, n)| {
                matches!(n.kind, NodeKind::Ident { .. } | NodeKind::MemberAccess { .. })
                    && tree.name_of(*id) == Some(name)
            })
            .map(|(id, _)| id)
            .collect();
        refs.sort_by_key(|&id| tree.span(id).start);
        refs
    }
}
