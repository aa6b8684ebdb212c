// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The per-invocation rule.
//!
//! For deferred-work constructs, every resolved Resource reference inside a
//! work argument is judged by where its instance is disposed:
//!
//! - captured by a parallel loop body: `ParallelLoopUsage`
//! - no enclosing disposal region: `UnscopedUsage`
//! - enclosing regions, none of them its own: `MixedInstance`
//! - its own region, opened outside this work: `UsedOutsideScope`
//!
//! For `AsParallel`, the query receiver is traced back to a result set.

use ctxlint_ast::{NodeId, NodeKind};
use ctxlint_semantic::{Symbol, SymbolKind};

use crate::classifier::{classify, Construct};
use crate::config::ConstructKind;
use crate::finding::{Finding, Reason};
use crate::matcher::{is_resource_type, type_matches};
use crate::scope::{enclosing_regions, find_enclosing_construct_of_kind, DisposalRegion, RegionKind};
use crate::RuleContext;

/// Findings for one invocation node. Empty for ordinary calls.
pub fn analyze_invocation(cx: RuleContext<'_>, invocation: NodeId) -> Vec<Finding> {
    let Some(construct) = classify(cx, invocation) else {
        return Vec::new();
    };
    match construct.kind {
        ConstructKind::ParallelLinq => check_parallel_query(cx, &construct).into_iter().collect(),
        _ => check_deferred_work(cx, &construct),
    }
}

fn check_deferred_work(cx: RuleContext<'_>, construct: &Construct) -> Vec<Finding> {
    let mut findings = Vec::new();
    for &work in &construct.work {
        for node in cx.tree.descendants(work) {
            let Some((name, sym)) = resource_reference(cx, node) else {
                continue;
            };
            if let Some((reason, owner)) = judge(cx, construct, node, name, sym) {
                findings.push(Finding {
                    span: cx.tree.span(node),
                    name: name.to_string(),
                    owner,
                    reason,
                    construct: construct.kind,
                });
            }
        }
    }
    findings
}

/// A resolved, Resource-typed variable or member reference.
fn resource_reference<'a>(cx: RuleContext<'a>, node: NodeId) -> Option<(&'a str, &'a Symbol)> {
    if !matches!(cx.tree.kind(node), NodeKind::Ident { .. } | NodeKind::MemberAccess { .. }) {
        return None;
    }
    let sym = cx.model.resolve(node)?;
    if matches!(sym.kind, SymbolKind::Type(_) | SymbolKind::Method { .. }) {
        return None;
    }
    if !is_resource_type(cx.model, cx.model.type_of(node), &cx.config.resource_type) {
        return None;
    }
    Some((cx.tree.name_of(node)?, sym))
}

fn judge(
    cx: RuleContext<'_>,
    construct: &Construct,
    node: NodeId,
    name: &str,
    sym: &Symbol,
) -> Option<(Reason, Option<String>)> {
    let captured = sym.decl.map_or(true, |decl| !construct.in_work(cx, decl));
    if construct.kind == ConstructKind::ParallelLoop && captured {
        return Some((Reason::ParallelLoopUsage, None));
    }

    let regions = enclosing_regions(cx, node);
    let Some(nearest) = regions.first() else {
        return Some((Reason::UnscopedUsage, None));
    };
    let Some(own) = regions.iter().find(|r| r.owner.as_deref() == Some(name)) else {
        return Some((Reason::MixedInstance, nearest.owner.clone()));
    };
    escapes(cx, construct, own, node).then(|| (Reason::UsedOutsideScope, own.owner.clone()))
}

/// True if the region disposing the instance was opened outside the
/// concurrent work that uses it.
fn escapes(cx: RuleContext<'_>, construct: &Construct, region: &DisposalRegion, node: NodeId) -> bool {
    match region.kind {
        RegionKind::Block => !cx.tree.is_ancestor_of(construct.invocation, region.node),
        RegionKind::Declaration => {
            let deferred = &ConstructKind::DEFERRED;
            let declared_in = find_enclosing_construct_of_kind(cx, region.node, deferred);
            let used_in = find_enclosing_construct_of_kind(cx, node, deferred);
            declared_in.map(|c| c.invocation) != used_in.map(|c| c.invocation)
        }
    }
}

fn check_parallel_query(cx: RuleContext<'_>, construct: &Construct) -> Option<Finding> {
    let receiver = *construct.work.first()?;
    let origin = query_origin(cx, receiver)?;
    let name = cx
        .tree
        .name_of(origin)
        .or_else(|| cx.tree.invocation_callee(origin).and_then(|c| cx.tree.name_of(c)))?;
    Some(Finding {
        span: cx.tree.span(origin),
        name: name.to_string(),
        owner: None,
        reason: Reason::UnsafeParallelQuery,
        construct: construct.kind,
    })
}

/// Follow a query chain (`a.Where(..).Select(..)`) back to a result-set
/// origin.
fn query_origin(cx: RuleContext<'_>, receiver: NodeId) -> Option<NodeId> {
    let tree = cx.tree;
    let mut node = tree.unparen(receiver);
    loop {
        if is_result_set_origin(cx, node) {
            return Some(node);
        }
        let callee = tree.unparen(tree.invocation_callee(node)?);
        node = tree.unparen(tree.member_receiver(callee)?);
    }
}

fn is_result_set_origin(cx: RuleContext<'_>, node: NodeId) -> bool {
    let model = cx.model;
    let result_set = |n: NodeId| is_resource_type(model, model.type_of(n), &cx.config.result_set_type);
    match cx.tree.kind(node) {
        NodeKind::Ident { .. } | NodeKind::MemberAccess { .. } => {
            let Some(sym) = model.resolve(node) else {
                return false;
            };
            match sym.kind {
                SymbolKind::Field | SymbolKind::Property => result_set(node),
                _ if sym.is_variable() => {
                    result_set(node)
                        || sym
                            .containing_type
                            .is_some_and(|ty| type_matches(model, ty, &cx.config.resource_type))
                }
                _ => false,
            }
        }
        NodeKind::Invocation => result_set(node),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, invocation_named, refs_named, Fixture};

    fn wrap(body: &str) -> String {
        format!(
            r#"
            using Microsoft.EntityFrameworkCore;

            class Product {{ public int Price {{ get; set; }} }}
            class ShopContext : DbContext
            {{
                public DbSet<Product> Products {{ get; set; }}
            }}

            class Service
            {{
                private readonly IDbContextFactory<ShopContext> factory;

                async Task Work(ShopContext ctx, List<Product> items)
                {{
                    {body}
                }}

                Task Process(ShopContext db) => Task.CompletedTask;
            }}
            "#
        )
    }

    fn run(f: &Fixture, member: &str) -> Vec<Finding> {
        analyze_invocation(f.cx(), invocation_named(&f.tree, member))
    }

    fn reasons(findings: &[Finding]) -> Vec<Reason> {
        findings.iter().map(|f| f.reason).collect()
    }

    #[test]
    fn captured_context_is_unscoped() {
        let f = fixture(&wrap("await Task.Run(() => ctx.SaveChanges());"));
        let findings = run(&f, "Run");
        assert_eq!(reasons(&findings), vec![Reason::UnscopedUsage]);
        let ctx_ref = refs_named(&f.tree, "ctx")[0];
        assert_eq!(findings[0].span, f.tree.span(ctx_ref));
        assert_eq!(findings[0].name, "ctx");
    }

    #[test]
    fn context_created_inside_work_is_fine() {
        let f = fixture(&wrap(
            "await Task.Run(() => { using var c = factory.CreateDbContext(); c.SaveChanges(); });",
        ));
        assert!(run(&f, "Run").is_empty());
    }

    #[test]
    fn parallel_loop_reports_each_reference() {
        let f = fixture(&wrap(
            "Parallel.ForEach(items, item => { ctx.Add(item); ctx.SaveChanges(); });",
        ));
        let findings = run(&f, "ForEach");
        assert_eq!(reasons(&findings), vec![Reason::ParallelLoopUsage; 2]);
        assert_ne!(findings[0].span, findings[1].span);
    }

    #[test]
    fn parallel_for_with_options_checks_the_body() {
        let f = fixture(&wrap(
            "var options = new ParallelOptions(); Parallel.For(0, 10, options, i => ctx.SaveChanges());",
        ));
        let findings = run(&f, "For");
        assert_eq!(reasons(&findings), vec![Reason::ParallelLoopUsage]);
        assert_eq!(findings[0].name, "ctx");
    }

    #[test]
    fn anonymous_delegate_work_is_checked() {
        let f = fixture(&wrap("await Task.Run(delegate { ctx.SaveChanges(); });"));
        let findings = run(&f, "Run");
        assert_eq!(reasons(&findings), vec![Reason::UnscopedUsage]);
        assert_eq!(findings[0].name, "ctx");
    }

    #[test]
    fn parallel_invoke_checks_every_action() {
        let f = fixture(&wrap("Parallel.Invoke(() => ctx.SaveChanges(), () => ctx.SaveChanges());"));
        let findings = run(&f, "Invoke");
        assert_eq!(reasons(&findings), vec![Reason::ParallelLoopUsage; 2]);
        assert_ne!(findings[0].span, findings[1].span);
    }

    #[test]
    fn disposal_block_outside_spawn() {
        let f = fixture(&wrap(
            "using (var scoped = factory.CreateDbContext()) { Task.Run(() => scoped.SaveChanges()); }",
        ));
        let findings = run(&f, "Run");
        assert_eq!(reasons(&findings), vec![Reason::UsedOutsideScope]);
        assert_eq!(findings[0].owner.as_deref(), Some("scoped"));
    }

    #[test]
    fn using_declaration_outside_spawn() {
        let f = fixture(&wrap(
            "using var scoped = factory.CreateDbContext(); await Task.Run(() => scoped.SaveChanges());",
        ));
        assert_eq!(reasons(&run(&f, "Run")), vec![Reason::UsedOutsideScope]);
    }

    #[test]
    fn foreign_instance_inside_owned_region() {
        let f = fixture(&wrap(
            "await Task.Run(() => { using var c = factory.CreateDbContext(); c.Add(items); ctx.SaveChanges(); });",
        ));
        let findings = run(&f, "Run");
        assert_eq!(reasons(&findings), vec![Reason::MixedInstance]);
        assert_eq!(findings[0].name, "ctx");
        assert_eq!(findings[0].owner.as_deref(), Some("c"));
    }

    #[test]
    fn wait_all_arguments_are_checked() {
        let f = fixture(&wrap("await Task.WhenAll(Process(ctx), Process(ctx));"));
        let findings = run(&f, "WhenAll");
        assert_eq!(reasons(&findings), vec![Reason::UnscopedUsage; 2]);
        assert!(findings.iter().all(|f| f.construct == ConstructKind::WaitAll));
    }

    #[test]
    fn non_work_arguments_are_ignored() {
        // The source sequence of ForEach is evaluated by the caller.
        let f = fixture(&wrap("Parallel.ForEach(ctx.Products, p => Touch(p));"));
        assert!(run(&f, "ForEach").is_empty());
    }

    #[test]
    fn loop_local_context_is_not_shared() {
        let f = fixture(&wrap(
            "Parallel.ForEach(items, item => { using var c = factory.CreateDbContext(); c.Add(item); });",
        ));
        assert!(run(&f, "ForEach").is_empty());
    }

    #[test]
    fn unresolved_names_are_skipped() {
        let f = fixture(&wrap("await Task.Run(() => mystery.SaveChanges());"));
        assert!(run(&f, "Run").is_empty());
    }

    #[test]
    fn ordinary_calls_yield_nothing() {
        let f = fixture(&wrap("ctx.SaveChanges();"));
        assert!(run(&f, "SaveChanges").is_empty());
    }

    #[test]
    fn parallel_query_over_result_set() {
        let f = fixture(&wrap("var big = ctx.Products.AsParallel().Where(p => p.Price > 10).ToList();"));
        let findings = run(&f, "AsParallel");
        assert_eq!(reasons(&findings), vec![Reason::UnsafeParallelQuery]);
        assert_eq!(findings[0].name, "Products");
        let products = refs_named(&f.tree, "Products")
            .into_iter()
            .find(|&id| matches!(f.tree.kind(id), NodeKind::MemberAccess { .. }))
            .unwrap();
        assert_eq!(findings[0].span, f.tree.span(products));
    }

    #[test]
    fn parallel_query_traces_through_operators() {
        let f = fixture(&wrap("var q = ctx.Products.Where(p => p.Price > 1).AsParallel();"));
        let findings = run(&f, "AsParallel");
        assert_eq!(reasons(&findings), vec![Reason::UnsafeParallelQuery]);
        assert_eq!(findings[0].name, "Products");
    }

    #[test]
    fn parallel_query_over_plain_list_is_fine() {
        let f = fixture(&wrap("var q = items.AsParallel().Where(p => p.Price > 1);"));
        assert!(run(&f, "AsParallel").is_empty());
    }
}
