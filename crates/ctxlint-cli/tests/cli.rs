// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! End-to-end tests for the `ctxlint` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn ctxlint_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push(format!("ctxlint{}", std::env::consts::EXE_SUFFIX));
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(ctxlint_binary())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("CTXLINT_LOG")
        .output()
        .expect("failed to run ctxlint")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

const SHARED: &str = r#"
class ShopContext : DbContext { }

class Importer
{
    void Import(ShopContext ctx)
    {
        Task.Run(() => ctx.SaveChanges());
    }
}
"#;

const SCOPED: &str = r#"
class ShopContext : DbContext { }

class Importer
{
    IDbContextFactory<ShopContext> factory;

    void Import()
    {
        Task.Run(() =>
        {
            using var db = factory.CreateDbContext();
            db.SaveChanges();
        });
    }
}
"#;

#[test]
fn warning_passes_unless_denied() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Importer.cs", SHARED);
    let file = file.to_str().unwrap();

    let out = run(&["check", file]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("warning[CTX1001]"), "{text}");
    assert!(text.contains("'ctx' is not scoped to the spawn"), "{text}");

    let denied = run(&["check", "--deny-warnings", file]);
    assert_eq!(denied.status.code(), Some(1));
}

#[test]
fn json_report_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Importer.cs", SHARED);
    write(dir.path(), "Clean.cs", SCOPED);

    let out = run(&["check", "--format", "json", dir.path().to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let reports: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);

    // Files are walked in name order.
    assert!(reports[0]["file"].as_str().unwrap().ends_with("Clean.cs"));
    assert_eq!(reports[0]["warning_count"], 0);
    assert_eq!(reports[1]["warning_count"], 1);
    assert_eq!(reports[1]["diagnostics"][0]["code"], "CTX1001");
    assert_eq!(reports[1]["diagnostics"][0]["location"]["line"], 8);
}

#[test]
fn clean_file_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Clean.cs", SCOPED);

    let out = run(&["check", "--deny-warnings", file.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("1 file clean"), "{text}");
    assert!(!text.contains("CTX1001"));
}

#[test]
fn syntax_error_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Broken.cs", "class A { void M() { var = ; } }\n");

    let out = run(&["check", file.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("error[E0100]"));
}

#[test]
fn non_csharp_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "README.md", "Task.Run(() => ctx.SaveChanges());");

    let out = run(&["check", dir.path().to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no .cs files found"));
}

#[test]
fn missing_path_is_usage_error() {
    let out = run(&["check", "/no/such/dir/anywhere"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn explain_known_and_unknown_codes() {
    let out = run(&["explain", "ctx1001"]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("CTX1001: DbContext should not be shared across threads"), "{text}");
    assert!(text.contains("IDbContextFactory"));

    let listed = stdout(&run(&["explain"]));
    assert!(listed.contains("E0100"));
    assert!(listed.contains("CTX1001"));

    let unknown = run(&["explain", "X9999"]);
    assert_eq!(unknown.status.code(), Some(2));
}

#[test]
fn symbols_dump_shows_context_parameter() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Importer.cs", SHARED);

    let out = run(&["symbols", file.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    let line = text
        .lines()
        .find(|l| l.contains(" ctx ") && l.contains("parameter"))
        .unwrap_or_else(|| panic!("no ctx reference in:\n{text}"));
    assert!(line.contains("ShopContext"), "{line}");
}
