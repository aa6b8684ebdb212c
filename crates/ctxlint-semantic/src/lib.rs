// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol and type information for analyzed trees.
//!
//! `SemanticModel` is the narrow query interface analysis passes consume.
//! `Binder` produces one (`BoundModel`) from a parsed tree; tests elsewhere
//! may implement it directly.

mod binder;
pub mod prelude;
mod scope;
mod symbol;
mod types;

pub use binder::{Binder, BoundModel};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolTable};
pub use types::{MemberInfo, MemberKind, TypeExpr, TypeId, TypeInfo, TypeRef, TypeTable};

use ctxlint_ast::{NodeId, SyntaxTree};

/// Symbol and type queries over one tree.
///
/// Implementations must be shareable across the threads that analyze the
/// tree's nodes.
pub trait SemanticModel: Sync {
    /// Symbol referenced by an identifier, member access, or invocation.
    fn resolve(&self, node: NodeId) -> Option<&Symbol>;

    /// Symbol introduced by a declaration node (local, parameter, member).
    fn declared(&self, decl: NodeId) -> Option<&Symbol>;

    /// Static type of an expression.
    fn type_of(&self, node: NodeId) -> Option<&TypeRef>;

    fn type_info(&self, ty: TypeId) -> Option<&TypeInfo>;

    /// Immediate base type.
    fn base_type(&self, ty: TypeId) -> Option<TypeId> {
        self.type_info(ty)?.base_id()
    }
}

/// Bind `tree` against the framework prelude.
pub fn bind(tree: &SyntaxTree) -> BoundModel {
    Binder::new(tree).bind()
}

/// Base chains longer than this are treated as cyclic and cut off.
pub const MAX_BASE_DEPTH: usize = 64;

/// Iterate `ty` and then each of its base types.
pub fn base_type_chain<M: SemanticModel + ?Sized>(model: &M, ty: TypeId) -> BaseTypeChain<'_, M> {
    BaseTypeChain {
        model,
        next: Some(ty),
        remaining: MAX_BASE_DEPTH,
    }
}

pub struct BaseTypeChain<'m, M: ?Sized> {
    model: &'m M,
    next: Option<TypeId>,
    remaining: usize,
}

impl<'m, M: SemanticModel + ?Sized> Iterator for BaseTypeChain<'m, M> {
    type Item = (TypeId, &'m TypeInfo);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let id = self.next.take()?;
        let info = self.model.type_info(id)?;
        self.next = info.base_id();
        Some((id, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlint_ast::NodeKind;

    fn bind_source(src: &str) -> (SyntaxTree, BoundModel) {
        let (result, lex_errors) = ctxlint_parser::parse_source(src);
        assert!(lex_errors.is_empty(), "{:?}", lex_errors);
        assert!(result.is_ok(), "{:?}", result.errors);
        let model = bind(&result.tree);
        (result.tree, model)
    }

    /// Nodes that are identifiers or member accesses with the given name.
    fn refs(tree: &SyntaxTree, name: &str) -> Vec<NodeId> {
        tree.iter()
            .filter(|(id, n)| {
                matches!(n.kind, NodeKind::Ident { .. } | NodeKind::MemberAccess { .. })
                    && tree.name_of(*id) == Some(name)
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn type_name(model: &BoundModel, node: NodeId) -> Option<String> {
        model.type_of(node).map(|t| model.display_type(t))
    }

    const SHOP: &str = r#"
        using Microsoft.EntityFrameworkCore;

        namespace Shop
        {
            public class Product { public int Price { get; set; } }

            public class ShopContext : DbContext
            {
                public DbSet<Product> Products { get; set; }
            }

            public class Service
            {
                private readonly IDbContextFactory<ShopContext> _factory;
                private readonly IServiceProvider _services;

                public async Task Run(ShopContext ctx)
                {
                    var fromFactory = _factory.CreateDbContext();
                    using var scope = _services.CreateScope();
                    var scoped = scope.ServiceProvider.GetRequiredService<ShopContext>();
                    var count = await ctx.Products.CountAsync();
                    foreach (var p in ctx.Products) { p.Price = 1; }
                    Task.Run(() => ctx.SaveChanges());
                }
            }
        }
    "#;

    #[test]
    fn source_class_chains_to_framework_base() {
        let (_, model) = bind_source(SHOP);
        let ctx = model.types().lookup("ShopContext", 0).unwrap();
        let names: Vec<String> = base_type_chain(&model, ctx)
            .map(|(_, info)| info.qualified_name())
            .collect();
        assert_eq!(
            names,
            vec!["Shop.ShopContext", "Microsoft.EntityFrameworkCore.DbContext", "System.object"]
        );
    }

    #[test]
    fn infers_local_types() {
        let (tree, model) = bind_source(SHOP);
        let first = |name: &str| refs(&tree, name)[0];

        let decl_type = |name: &str| {
            model
                .symbols()
                .iter()
                .find(|s| s.name == name && s.is_variable())
                .and_then(|s| s.ty.clone())
                .map(|t| model.display_type(&t))
        };
        assert_eq!(decl_type("fromFactory").as_deref(), Some("ShopContext"));
        assert_eq!(decl_type("scope").as_deref(), Some("IServiceScope"));
        assert_eq!(decl_type("scoped").as_deref(), Some("ShopContext"));
        assert_eq!(decl_type("count").as_deref(), Some("int"));
        assert_eq!(decl_type("p").as_deref(), Some("Product"));

        assert_eq!(type_name(&model, first("Products")).as_deref(), Some("DbSet<Product>"));
    }

    #[test]
    fn resolves_methods_to_their_declaring_type() {
        let (tree, model) = bind_source(SHOP);
        let run = refs(&tree, "Run")
            .into_iter()
            .find(|&id| matches!(tree.kind(id), NodeKind::MemberAccess { .. }))
            .unwrap();
        let sym = model.resolve(run).unwrap();
        assert!(matches!(sym.kind, SymbolKind::Method { .. }));
        let owner = model.type_info(sym.containing_type.unwrap()).unwrap();
        assert_eq!(owner.qualified_name(), "System.Threading.Tasks.Task");

        // The invocation resolves to the same method.
        let call = tree.parent(run).unwrap();
        assert_eq!(model.resolve(call).map(|s| s.id), Some(sym.id));
    }

    #[test]
    fn captured_parameter_resolves_inside_lambda() {
        let (tree, model) = bind_source(SHOP);
        let ctx_refs = refs(&tree, "ctx");
        let last = *ctx_refs.last().unwrap();
        let sym = model.resolve(last).unwrap();
        assert_eq!(sym.kind, SymbolKind::Parameter);
        assert_eq!(type_name(&model, last).as_deref(), Some("ShopContext"));
    }

    #[test]
    fn unknown_names_stay_unresolved() {
        let (tree, model) = bind_source("var x = mystery.Thing(); x.Go();");
        for id in refs(&tree, "mystery").into_iter().chain(refs(&tree, "Go")) {
            assert!(model.resolve(id).is_none());
        }
        // `x` itself resolves, but has no type.
        let x = refs(&tree, "x")[0];
        assert!(model.resolve(x).is_some());
        assert!(model.type_of(x).is_none());
    }

    #[test]
    fn cyclic_bases_terminate() {
        let (_, model) = bind_source("class A : B { } class B : A { }");
        let a = model.types().lookup("A", 0).unwrap();
        assert_eq!(base_type_chain(&model, a).count(), MAX_BASE_DEPTH);
    }

    #[test]
    fn using_locals_are_marked() {
        let (_, model) = bind_source(
            "using (var a = Make()) { } using var b = Make(); var c = Make();",
        );
        let kind = |name: &str| {
            model
                .symbols()
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.kind.clone())
        };
        assert_eq!(kind("a"), Some(SymbolKind::Local { is_using: true }));
        assert_eq!(kind("b"), Some(SymbolKind::Local { is_using: true }));
        assert_eq!(kind("c"), Some(SymbolKind::Local { is_using: false }));
    }
}
