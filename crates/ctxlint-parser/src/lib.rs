// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the analyzed C# subset.
//!
//! Transforms a token stream into an arena-indexed `SyntaxTree`.

mod hints;
mod parser;

pub use parser::{ParseError, ParseResult, Parser};

/// Lex and parse `source` in one step. Lex errors come first in `errors`.
pub fn parse_source(source: &str) -> (ParseResult, Vec<ctxlint_lexer::LexError>) {
    let lex_result = ctxlint_lexer::Lexer::new(source).tokenize();
    let parse_result = Parser::new(lex_result.tokens).parse();
    (parse_result, lex_result.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlint_ast::{NodeId, NodeKind, SyntaxTree};

    fn parse(src: &str) -> ParseResult {
        let lex_result = ctxlint_lexer::Lexer::new(src).tokenize();
        assert!(lex_result.is_ok(), "Lex errors: {:?}", lex_result.errors);
        let result = Parser::new(lex_result.tokens).parse();
        assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
        result
    }

    fn find(tree: &SyntaxTree, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        tree.iter()
            .filter(|(_, n)| pred(&n.kind))
            .map(|(id, _)| id)
            .collect()
    }

    fn labels_under(tree: &SyntaxTree, id: NodeId) -> Vec<&'static str> {
        tree.descendants(id).map(|n| tree.kind(n).label()).collect()
    }

    #[test]
    fn parse_class_with_members() {
        let src = r#"
            using Microsoft.EntityFrameworkCore;

            namespace Shop.Data
            {
                public class AppDbContext : DbContext
                {
                    public DbSet<Product> Products { get; set; }
                    private readonly int _count = 0, _other;

                    public AppDbContext(DbContextOptions<AppDbContext> options) : base(options) { }

                    public async Task<int> CountAsync() => await Products.CountAsync();
                }
            }
        "#;
        let result = parse(src);
        let tree = &result.tree;

        let classes = find(tree, |k| matches!(k, NodeKind::Class { .. }));
        assert_eq!(classes.len(), 1);
        match tree.kind(classes[0]) {
            NodeKind::Class { name, bases, .. } => {
                assert_eq!(name, "AppDbContext");
                assert_eq!(bases[0].name, "DbContext");
            }
            _ => unreachable!(),
        }

        let props = find(tree, |k| matches!(k, NodeKind::Property { .. }));
        match tree.kind(props[0]) {
            NodeKind::Property { name, ty } => {
                assert_eq!(name, "Products");
                assert_eq!(ty.to_string(), "DbSet<Product>");
            }
            _ => unreachable!(),
        }

        assert_eq!(find(tree, |k| matches!(k, NodeKind::Field { .. })).len(), 2);
        assert_eq!(find(tree, |k| matches!(k, NodeKind::Constructor { .. })).len(), 1);

        let methods = find(tree, |k| matches!(k, NodeKind::Method { .. }));
        match tree.kind(methods[0]) {
            NodeKind::Method { name, ret, is_async, .. } => {
                assert_eq!(name, "CountAsync");
                assert_eq!(ret.to_string(), "Task<int>");
                assert!(*is_async);
            }
            _ => unreachable!(),
        }
        let body = tree.body(methods[0]).unwrap();
        assert!(matches!(tree.kind(body), NodeKind::Await));
    }

    #[test]
    fn parse_spawn_with_lambda() {
        let result = parse("Task.Run(() => ctx.SaveChanges());");
        let tree = &result.tree;
        let calls = find(tree, |k| matches!(k, NodeKind::Invocation));
        assert_eq!(calls.len(), 2);

        // The outer call is allocated last.
        let outer = *calls.last().unwrap();
        let callee = tree.invocation_callee(outer).unwrap();
        assert_eq!(tree.name_of(callee), Some("Run"));
        let args = tree.invocation_args(outer);
        assert_eq!(args.len(), 1);
        assert!(matches!(
            tree.kind(args[0]),
            NodeKind::Lambda { parenthesized: true, is_async: false }
        ));
        assert_eq!(
            labels_under(tree, args[0]),
            vec!["Lambda", "Invocation", "MemberAccess", "Ident"]
        );
    }

    #[test]
    fn parse_using_declaration_and_statement() {
        let src = r#"
            Task.Run(() => { using var c = factory.CreateDbContext(); c.SaveChanges(); });
            using (var ctx = factory.CreateDbContext()) { ctx.SaveChanges(); }
        "#;
        let result = parse(src);
        let tree = &result.tree;

        let decls = find(tree, |k| matches!(k, NodeKind::LocalDecl { .. }));
        assert_eq!(decls.len(), 2);
        assert!(matches!(tree.kind(decls[0]), NodeKind::LocalDecl { is_using: true, ty: None, .. }));
        assert!(matches!(tree.kind(decls[1]), NodeKind::LocalDecl { is_using: false, .. }));

        let usings = find(tree, |k| matches!(k, NodeKind::UsingStmt));
        assert_eq!(usings.len(), 1);
        let children = tree.children(usings[0]);
        assert_eq!(children[0], decls[1]);
        assert!(matches!(tree.kind(children[1]), NodeKind::Block));
    }

    #[test]
    fn multiple_using_declarators_nest() {
        let result = parse("using (var a = Make(), b = Make()) { a.Run(); }");
        let tree = &result.tree;
        let usings = find(tree, |k| matches!(k, NodeKind::UsingStmt));
        assert_eq!(usings.len(), 2);
        // inner is allocated first and lives in the outer's body slot
        assert_eq!(tree.children(usings[1])[1], usings[0]);
    }

    #[test]
    fn parse_lambda_forms() {
        let src = r#"
            Parallel.ForEach(items, item => { ctx.Add(item); });
            Parallel.For(0, 10, (int i) => Work(i));
            Task.Factory.StartNew(delegate { ctx.SaveChanges(); });
            Task.Run(async () => await ctx.SaveChangesAsync());
        "#;
        let result = parse(src);
        let tree = &result.tree;
        let simple = find(tree, |k| matches!(k, NodeKind::Lambda { parenthesized: false, .. }));
        assert_eq!(simple.len(), 1);
        assert_eq!(tree.params(simple[0]).count(), 1);

        let paren = find(tree, |k| matches!(k, NodeKind::Lambda { parenthesized: true, .. }));
        assert_eq!(paren.len(), 2);
        assert!(paren
            .iter()
            .any(|&l| matches!(tree.kind(l), NodeKind::Lambda { is_async: true, .. })));

        let anon = find(tree, |k| matches!(k, NodeKind::AnonymousMethod { .. }));
        assert_eq!(anon.len(), 1);
        assert!(matches!(tree.kind(tree.body(anon[0]).unwrap()), NodeKind::Block));
    }

    #[test]
    fn parse_generic_method_call_and_comparison() {
        let src = r#"
            var ctx = scope.ServiceProvider.GetRequiredService<AppDbContext>();
            var ok = count < limit;
        "#;
        let result = parse(src);
        let tree = &result.tree;
        let access = find(tree, |k| {
            matches!(k, NodeKind::MemberAccess { name, .. } if name == "GetRequiredService")
        });
        match tree.kind(access[0]) {
            NodeKind::MemberAccess { type_args, .. } => {
                assert_eq!(type_args[0].name, "AppDbContext")
            }
            _ => unreachable!(),
        }
        assert_eq!(find(tree, |k| matches!(k, NodeKind::Binary { .. })).len(), 1);
    }

    #[test]
    fn parse_parallel_query_chain() {
        let result = parse("var big = ctx.Products.AsParallel().Where(p => p.Price > 10).ToList();");
        let tree = &result.tree;
        let names: Vec<&str> = find(tree, |k| matches!(k, NodeKind::MemberAccess { .. }))
            .into_iter()
            .filter_map(|id| tree.name_of(id))
            .collect();
        assert!(names.contains(&"AsParallel"));
        assert!(names.contains(&"Products"));
    }

    #[test]
    fn parse_control_flow() {
        let src = r#"
            foreach (var p in ctx.Products) { Console.WriteLine(p.Name); }
            for (var i = 0; i < 3; i++) { Work(i); }
            while (running) { running = Step(); }
            try { Work(); } catch (Exception ex) { Log(ex); } finally { Done(); }
            if (a == null) return; else { b = a ?? c; }
            var x = flag ? one : two;
        "#;
        let result = parse(src);
        let tree = &result.tree;
        assert_eq!(find(tree, |k| matches!(k, NodeKind::ForEach { .. })).len(), 1);
        assert_eq!(find(tree, |k| matches!(k, NodeKind::For)).len(), 1);
        assert_eq!(find(tree, |k| matches!(k, NodeKind::While)).len(), 1);
        assert_eq!(find(tree, |k| matches!(k, NodeKind::Catch { .. })).len(), 1);
        assert_eq!(find(tree, |k| matches!(k, NodeKind::Conditional)).len(), 1);
    }

    #[test]
    fn parse_object_creation_with_initializer() {
        let result = parse("var w = new Worker(ctx) { Name = \"a\", Db = other };");
        let tree = &result.tree;
        let created = find(tree, |k| matches!(k, NodeKind::ObjectCreation { .. }));
        assert_eq!(created.len(), 1);
        // one argument plus two initializer assignments
        assert_eq!(tree.children(created[0]).len(), 3);
    }

    #[test]
    fn file_scoped_namespace() {
        let result = parse("namespace Shop;\nclass A { }\nclass B : A { }");
        let tree = &result.tree;
        let ns = find(tree, |k| matches!(k, NodeKind::Namespace { .. }));
        assert_eq!(ns.len(), 1);
        assert_eq!(tree.children(ns[0]).len(), 2);
    }

    #[test]
    fn parents_cover_every_node_but_root() {
        let result = parse("class A { void M() { Task.Run(() => { var x = 1; }); } }");
        let tree = &result.tree;
        let root = tree.root().unwrap();
        for (id, node) in tree.iter() {
            if id != root {
                assert!(node.parent.is_some(), "orphan {:?} {:?}", id, node.kind);
            }
        }
    }

    #[test]
    fn recovers_from_broken_statement() {
        let src = "class A { void M() { var = ; Task.Run(() => ctx.Save()); } }";
        let lex = ctxlint_lexer::Lexer::new(src).tokenize();
        let result = Parser::new(lex.tokens).parse();
        assert!(!result.is_ok());
        let tree = &result.tree;
        // The statement after the broken one still parses.
        assert_eq!(find(tree, |k| matches!(k, NodeKind::Lambda { .. })).len(), 1);
        assert_eq!(find(tree, |k| matches!(k, NodeKind::Error)).len(), 1);
    }

    #[test]
    fn missing_semicolon_has_hint() {
        let lex = ctxlint_lexer::Lexer::new("x = 1 }").tokenize();
        let result = Parser::new(lex.tokens).parse();
        assert!(!result.is_ok());
        assert!(result.errors[0].hint.is_some());
    }
}
