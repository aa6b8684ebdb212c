// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Disposal regions and enclosing-construct lookup.
//!
//! Both walks are upward from a reference through parent links. Only regions
//! whose resource is Resource-typed count; a `using` over a file handle does
//! not own a context.

use ctxlint_ast::{NodeId, NodeKind};

use crate::classifier::{classify, Construct};
use crate::config::ConstructKind;
use crate::matcher::is_resource_type;
use crate::RuleContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// `using (resource) { ... }`; the region is the statement.
    Block,
    /// `using var x = ...;`; the region runs from the declaration to the end
    /// of its enclosing block.
    Declaration,
}

/// A lexical region that disposes one Resource on exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalRegion {
    /// The `UsingStmt` or the `using` `LocalDecl`.
    pub node: NodeId,
    pub kind: RegionKind,
    /// Name of the owned instance. `None` when the resource is an
    /// expression that isn't a plain name (`using (Create()) { }`).
    pub owner: Option<String>,
}

/// Resource-owning regions around `node`, innermost first.
pub fn enclosing_regions(cx: RuleContext<'_>, node: NodeId) -> Vec<DisposalRegion> {
    let tree = cx.tree;
    let mut regions = Vec::new();
    let mut child = node;
    for ancestor in tree.ancestors(node) {
        let children = tree.children(ancestor);
        match tree.kind(ancestor) {
            NodeKind::UsingStmt if children.get(1) == Some(&child) => {
                if let Some(region) = block_region(cx, ancestor) {
                    regions.push(region);
                }
            }
            NodeKind::Block | NodeKind::CompilationUnit | NodeKind::Namespace { .. } => {
                let position = children.iter().position(|&c| c == child).unwrap_or(0);
                for &stmt in children[..position].iter().rev() {
                    if let Some(region) = declaration_region(cx, stmt) {
                        regions.push(region);
                    }
                }
            }
            _ => {}
        }
        child = ancestor;
    }
    regions
}

/// Nearest region around `node`.
pub fn find_owning_region(cx: RuleContext<'_>, node: NodeId) -> Option<DisposalRegion> {
    enclosing_regions(cx, node).into_iter().next()
}

/// Nearest invocation classified as one of `kinds` whose work contains
/// `node`. Invocations that merely sit above `node` as callee or receiver
/// don't count.
pub fn find_enclosing_construct_of_kind(
    cx: RuleContext<'_>,
    node: NodeId,
    kinds: &[ConstructKind],
) -> Option<Construct> {
    cx.tree
        .ancestors(node)
        .filter(|&a| matches!(cx.tree.kind(a), NodeKind::Invocation))
        .filter_map(|a| classify(cx, a))
        .find(|c| kinds.contains(&c.kind) && c.in_work(cx, node))
}

fn block_region(cx: RuleContext<'_>, using: NodeId) -> Option<DisposalRegion> {
    let resource = *cx.tree.children(using).first()?;
    let (owner, ty) = match cx.tree.kind(resource) {
        NodeKind::LocalDecl { .. } => {
            let sym = cx.model.declared(resource)?;
            (Some(sym.name.clone()), sym.ty.as_ref())
        }
        _ => {
            let expr = cx.tree.unparen(resource);
            (cx.tree.name_of(expr).map(str::to_string), cx.model.type_of(expr))
        }
    };
    is_resource_type(cx.model, ty, &cx.config.resource_type).then_some(DisposalRegion {
        node: using,
        kind: RegionKind::Block,
        owner,
    })
}

fn declaration_region(cx: RuleContext<'_>, stmt: NodeId) -> Option<DisposalRegion> {
    if !matches!(cx.tree.kind(stmt), NodeKind::LocalDecl { is_using: true, .. }) {
        return None;
    }
    let sym = cx.model.declared(stmt)?;
    is_resource_type(cx.model, sym.ty.as_ref(), &cx.config.resource_type).then(|| DisposalRegion {
        node: stmt,
        kind: RegionKind::Declaration,
        owner: Some(sym.name.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, invocation_named, refs_named};

    const SERVICE: &str = r#"
        using Microsoft.EntityFrameworkCore;

        class ShopContext : DbContext { }

        class Service
        {
            private readonly IDbContextFactory<ShopContext> _factory;

            void Blocks(ShopContext loose)
            {
                using (var outer = _factory.CreateDbContext())
                {
                    using var inner = _factory.CreateDbContext();
                    Touch(inner, outer, loose);
                }
                Touch(loose);
            }
        }
    "#;

    fn owners(regions: &[DisposalRegion]) -> Vec<Option<&str>> {
        regions.iter().map(|r| r.owner.as_deref()).collect()
    }

    #[test]
    fn regions_are_innermost_first() {
        let f = fixture(SERVICE);
        let inner_ref = refs_named(&f.tree, "inner")[0];
        let regions = enclosing_regions(f.cx(), inner_ref);
        assert_eq!(owners(&regions), vec![Some("inner"), Some("outer")]);
        assert_eq!(regions[0].kind, RegionKind::Declaration);
        assert_eq!(regions[1].kind, RegionKind::Block);
        assert_eq!(
            find_owning_region(f.cx(), inner_ref).and_then(|r| r.owner),
            Some("inner".to_string())
        );
    }

    #[test]
    fn reference_after_region_is_unscoped() {
        let f = fixture(SERVICE);
        let loose_refs = refs_named(&f.tree, "loose");
        assert_eq!(loose_refs.len(), 2);
        assert_eq!(enclosing_regions(f.cx(), loose_refs[0]).len(), 2);
        assert!(enclosing_regions(f.cx(), loose_refs[1]).is_empty());
    }

    #[test]
    fn initializer_is_outside_its_own_region() {
        let src = r#"
            class ShopContext : DbContext { }
            class C
            {
                void M(IDbContextFactory<ShopContext> f)
                {
                    using var a = f.CreateDbContext();
                    using var b = a;
                }
            }
        "#;
        let f = fixture(src);
        let a_ref = refs_named(&f.tree, "a")[0];
        assert_eq!(owners(&enclosing_regions(f.cx(), a_ref)), vec![Some("a")]);
    }

    #[test]
    fn non_resource_using_is_ignored() {
        let src = r#"
            class ShopContext : DbContext { }
            class Handle : IDisposable { }
            class C { void M(Handle h, ShopContext ctx) { using (h) { ctx.SaveChanges(); } } }
        "#;
        let f = fixture(src);
        let ctx_ref = refs_named(&f.tree, "ctx")[0];
        assert!(enclosing_regions(f.cx(), ctx_ref).is_empty());
    }

    #[test]
    fn enclosing_construct_requires_work_position() {
        let src = r#"
            Task.Run(() => Parallel.ForEach(items, i => Use(i)));
        "#;
        let f = fixture(src);
        let cx = f.cx();
        let use_call = invocation_named(&f.tree, "Use");
        let for_each = invocation_named(&f.tree, "ForEach");
        let run = invocation_named(&f.tree, "Run");

        let loop_construct =
            find_enclosing_construct_of_kind(cx, use_call, &ConstructKind::DEFERRED).unwrap();
        assert_eq!(loop_construct.invocation, for_each);

        let spawn = find_enclosing_construct_of_kind(cx, use_call, &[ConstructKind::SpawnSingle]).unwrap();
        assert_eq!(spawn.invocation, run);

        // `items` is an argument of ForEach but not its work.
        let items = refs_named(&f.tree, "items")[0];
        let outer = find_enclosing_construct_of_kind(cx, items, &ConstructKind::DEFERRED).unwrap();
        assert_eq!(outer.invocation, run);

        assert!(find_enclosing_construct_of_kind(cx, run, &ConstructKind::DEFERRED).is_none());
    }
}
