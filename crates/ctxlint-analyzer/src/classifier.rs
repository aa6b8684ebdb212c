// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Concurrency construct classification.
//!
//! An invocation is a construct when its member name and the invoked
//! method's containing type match a descriptor in the rule configuration.

use ctxlint_ast::NodeId;
use ctxlint_semantic::SymbolKind;

use crate::config::{ConstructKind, WorkArgs};
use crate::RuleContext;

/// A classified concurrency-launching invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construct {
    pub invocation: NodeId,
    pub kind: ConstructKind,
    /// Deferred-work arguments, or the query receiver for `ParallelLinq`.
    pub work: Vec<NodeId>,
}

impl Construct {
    /// True if `node` lies inside one of the work expressions.
    pub fn in_work(&self, cx: RuleContext<'_>, node: NodeId) -> bool {
        self.work.iter().any(|&w| cx.tree.encloses(w, node))
    }
}

/// Classify one invocation node. `None` for ordinary calls.
pub fn classify(cx: RuleContext<'_>, invocation: NodeId) -> Option<Construct> {
    let tree = cx.tree;
    let callee = tree.unparen(tree.invocation_callee(invocation)?);
    let member = tree.name_of(callee)?;

    let mut candidates = cx.config.constructs_for(member).peekable();
    candidates.peek()?;
    let type_name = containing_type_name(cx, invocation, callee);
    let desc = candidates.find(|d| d.type_match.matches(type_name))?;

    let args = tree.invocation_args(invocation);
    let work: Vec<NodeId> = match desc.work {
        WorkArgs::All => args.to_vec(),
        WorkArgs::Index(i) => args.get(i).copied().into_iter().collect(),
        WorkArgs::Last => args.last().copied().into_iter().collect(),
        WorkArgs::Receiver => tree.member_receiver(callee).into_iter().collect(),
    };

    Some(Construct {
        invocation,
        kind: desc.kind,
        work: work.into_iter().map(|w| tree.unparen(w)).collect(),
    })
}

/// Simple name of the type declaring the invoked method.
///
/// Prefers the resolved method symbol; falls back to the receiver's static
/// type, a type-name receiver, and finally the receiver as written.
fn containing_type_name<'a>(cx: RuleContext<'a>, invocation: NodeId, callee: NodeId) -> Option<&'a str> {
    let model = cx.model;
    let method = model.resolve(invocation).or_else(|| model.resolve(callee));
    if let Some(sym) = method {
        if let (SymbolKind::Method { .. }, Some(owner)) = (&sym.kind, sym.containing_type) {
            if let Some(info) = model.type_info(owner) {
                return Some(info.name.as_str());
            }
        }
    }

    let receiver = cx.tree.unparen(cx.tree.member_receiver(callee)?);
    if let Some(ty) = model.type_of(receiver) {
        return model.type_info(ty.id).map(|info| info.name.as_str());
    }
    match model.resolve(receiver) {
        Some(sym) => match sym.kind {
            SymbolKind::Type(id) => model.type_info(id).map(|info| info.name.as_str()),
            _ => None,
        },
        None => cx.tree.name_of(receiver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, invocation_named};

    fn kind_of(src: &str, member: &str) -> Option<ConstructKind> {
        let f = fixture(src);
        let node = invocation_named(&f.tree, member);
        classify(f.cx(), node).map(|c| c.kind)
    }

    #[test]
    fn task_entry_points() {
        assert_eq!(kind_of("Task.Run(() => 1);", "Run"), Some(ConstructKind::SpawnSingle));
        assert_eq!(
            kind_of("Task.Factory.StartNew(() => 1);", "StartNew"),
            Some(ConstructKind::SpawnFactory)
        );
        assert_eq!(kind_of("Task.WhenAll(a, b);", "WhenAll"), Some(ConstructKind::WaitAll));
        assert_eq!(kind_of("Task.WaitAny(a);", "WaitAny"), Some(ConstructKind::WaitAll));
    }

    #[test]
    fn parallel_entry_points() {
        assert_eq!(
            kind_of("Parallel.ForEach(items, i => { });", "ForEach"),
            Some(ConstructKind::ParallelLoop)
        );
        assert_eq!(
            kind_of("Parallel.For(0, 10, i => { });", "For"),
            Some(ConstructKind::ParallelLoop)
        );
        assert_eq!(
            kind_of("var q = items.AsParallel();", "AsParallel"),
            Some(ConstructKind::ParallelLinq)
        );
    }

    #[test]
    fn same_member_on_other_types_is_ignored() {
        let src = r#"
            class Runner { public void Run(Action a) { } }
            class Host { void M(Runner r) { r.Run(() => { }); } }
        "#;
        assert_eq!(kind_of(src, "Run"), None);
        assert_eq!(kind_of("list.ForEach(x => { });", "ForEach"), None);
    }

    #[test]
    fn derived_task_factory_matches_by_name() {
        let src = r#"
            class MyTaskFactory : TaskFactory { }
            class Host { void M(MyTaskFactory f) { f.StartNew(() => { }); } }
        "#;
        assert_eq!(kind_of(src, "StartNew"), Some(ConstructKind::SpawnFactory));
    }

    #[test]
    fn work_arguments_follow_descriptor() {
        let f = fixture("Parallel.For(0, 10, i => Work(i)); Task.WhenAll(A(), B());");
        let cx = f.cx();

        let for_call = classify(cx, invocation_named(&f.tree, "For")).unwrap();
        assert_eq!(for_call.work.len(), 1);
        assert!(f.tree.kind(for_call.work[0]).is_lambda_like());

        let when_all = classify(cx, invocation_named(&f.tree, "WhenAll")).unwrap();
        assert_eq!(when_all.work.len(), 2);
    }

    #[test]
    fn parallel_for_body_is_last_with_options() {
        let f = fixture("var options = new ParallelOptions(); Parallel.For(0, 10, options, i => Work(i));");
        let c = classify(f.cx(), invocation_named(&f.tree, "For")).unwrap();
        assert_eq!(c.work.len(), 1);
        assert!(f.tree.kind(c.work[0]).is_lambda_like());
    }

    #[test]
    fn parallel_query_work_is_the_receiver() {
        let f = fixture("var q = source.Where(x => x).AsParallel();");
        let c = classify(f.cx(), invocation_named(&f.tree, "AsParallel")).unwrap();
        assert_eq!(c.work.len(), 1);
        assert!(matches!(f.tree.kind(c.work[0]), ctxlint_ast::NodeKind::Invocation));
    }
}
