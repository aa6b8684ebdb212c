// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Analyzing the same tree twice yields the same findings.

use ctxlint_analyzer::{collect_findings, RuleConfig};
use proptest::prelude::*;

const STATEMENTS: &[&str] = &[
    "Task.Run(() => ctx.SaveChanges());",
    "Parallel.ForEach(ids, id => ctx.Find(id));",
    "Task.Run(() => { using var own = factory.CreateDbContext(); own.SaveChanges(); });",
    "Task.Run(() => { using var own = factory.CreateDbContext(); ctx.SaveChanges(); });",
    "using (var scoped = factory.CreateDbContext()) { Task.Run(() => scoped.SaveChanges()); }",
    "var q = ctx.Products.AsParallel().ToList();",
    "Task.WhenAll(Save(ctx), Save(ctx));",
    "ctx.SaveChanges();",
];

fn program(picks: &[usize]) -> String {
    let body: Vec<&str> = picks.iter().map(|&i| STATEMENTS[i]).collect();
    format!(
        r#"
        class Item {{ }}
        class ShopContext : DbContext {{ public DbSet<Item> Products {{ get; set; }} }}
        class Job
        {{
            IDbContextFactory<ShopContext> factory;
            Task Save(ShopContext c) => c.SaveChangesAsync();
            void Run(ShopContext ctx, List<int> ids)
            {{
                {}
            }}
        }}
        "#,
        body.join("\n")
    )
}

proptest! {
    #[test]
    fn repeated_analysis_is_stable(picks in prop::collection::vec(0..STATEMENTS.len(), 0..8)) {
        let source = program(&picks);
        let (result, _) = ctxlint_parser::parse_source(&source);
        prop_assert!(result.is_ok());
        let model = ctxlint_semantic::bind(&result.tree);
        let config = RuleConfig::default();

        let first = collect_findings(&result.tree, &model, &config);
        let second = collect_findings(&result.tree, &model, &config);
        prop_assert_eq!(&first, &second);

        // Findings never point outside the source.
        for finding in &first {
            prop_assert!(finding.span.end <= source.len());
        }
    }
}
