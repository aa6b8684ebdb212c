// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal rendering of diagnostics.
//!
//! ```text
//! warning[CTX1001]: DbContext should not be shared across threads: 'ctx' is not scoped to the spawn
//!  --> Jobs.cs:19:35
//!     |
//!  19 |             return Task.Run(() => ctx.SaveChanges());
//!     |                                   ^^^ 'ctx' is not scoped to the spawn
//!     |
//!     = note: reason: unscoped-usage
//!     = help: create a context per unit of work with IDbContextFactory and dispose it with `using`
//! ```

use std::collections::BTreeMap;

use colored::Colorize;
use ctxlint_ast::LineMap;

use crate::{Diagnostic, LabelStyle, Severity};

pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

struct Annotation<'d> {
    col_start: usize,
    col_end: usize,
    style: LabelStyle,
    message: Option<&'d str>,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            file_name: None,
            line_map: LineMap::new(source),
        }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        let lines = self.annotated_lines(diagnostic);
        let gutter = lines
            .keys()
            .last()
            .map(|n| n.to_string().len())
            .unwrap_or(1)
            .max(2);

        if let Some(span) = diagnostic.primary_span() {
            let (line, col) = self.line_map.offset_to_line_col(span.start);
            out.push_str(&format!(
                "{}{} {}:{}:{}\n",
                " ".repeat(gutter - 1),
                "-->".blue(),
                self.file_name.unwrap_or("<source>"),
                line,
                col
            ));
            out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
        }

        let mut prev: Option<usize> = None;
        for (line_num, annotations) in &lines {
            if prev.is_some_and(|p| *line_num > p + 1) {
                out.push_str(&format!("{}{}\n", " ".repeat(gutter), "...".blue()));
            }
            let text = self.line_map.line_text(self.source, *line_num).unwrap_or("");
            out.push_str(&format!(
                "{:>width$} {} {}\n",
                line_num.to_string().blue().bold(),
                "|".blue(),
                text,
                width = gutter + 1,
            ));
            for ann in annotations {
                self.format_annotation(&mut out, ann, gutter);
            }
            prev = Some(*line_num);
        }

        self.format_footer(&mut out, diagnostic, gutter, !lines.is_empty());
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".blue().bold(),
        };
        match &diagnostic.code {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code.0.as_str().bold(),
                diagnostic.message.bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity, diagnostic.message.bold())),
        }
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic, gutter: usize, had_source: bool) {
        let pad = " ".repeat(gutter + 1);
        if had_source && (!diagnostic.notes.is_empty() || diagnostic.help.is_some()) {
            out.push_str(&format!("{} {}\n", pad, "|".blue()));
        }
        for note in &diagnostic.notes {
            out.push_str(&format!("{} {} {}: {}\n", pad, "=".cyan(), "note".cyan().bold(), note));
        }
        if let Some(help) = &diagnostic.help {
            out.push_str(&format!("{} {} {}: {}\n", pad, "=".cyan(), "help".cyan().bold(), help));
        }
    }

    fn format_annotation(&self, out: &mut String, ann: &Annotation<'_>, gutter: usize) {
        let width = ann.col_end.saturating_sub(ann.col_start).max(1);
        let (marks, message) = match ann.style {
            LabelStyle::Primary => (
                "^".repeat(width).red().bold(),
                ann.message.unwrap_or("").red().bold(),
            ),
            LabelStyle::Secondary => ("-".repeat(width).blue(), ann.message.unwrap_or("").blue()),
        };
        out.push_str(&format!(
            "{} {} {}{} {}\n",
            " ".repeat(gutter + 1),
            "|".blue(),
            " ".repeat(ann.col_start.saturating_sub(1)),
            marks,
            message
        ));
    }

    /// Labels grouped by the line they start on. Multi-line spans are cut
    /// at the end of their first line.
    fn annotated_lines<'d>(&self, diagnostic: &'d Diagnostic) -> BTreeMap<usize, Vec<Annotation<'d>>> {
        let mut lines: BTreeMap<usize, Vec<Annotation<'d>>> = BTreeMap::new();
        for label in &diagnostic.labels {
            let (line, col_start) = self.line_map.offset_to_line_col(label.span.start);
            let (end_line, end_col) = self.line_map.offset_to_line_col(label.span.end);
            let col_end = if end_line == line {
                end_col
            } else {
                self.line_map.line_text(self.source, line).map_or(col_start, |t| t.len() + 1)
            };
            lines.entry(line).or_default().push(Annotation {
                col_start,
                col_end,
                style: label.style,
                message: label.message.as_deref(),
            });
        }
        for annotations in lines.values_mut() {
            annotations.sort_by_key(|a| (a.style != LabelStyle::Primary, a.col_start));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlint_ast::Span;

    fn plain<T>(f: impl FnOnce() -> T) -> T {
        colored::control::set_override(false);
        f()
    }

    #[test]
    fn renders_location_and_underline() {
        let source = "class A\n{\n    void M() { Task.Run(() => ctx.Save()); }\n}\n";
        let start = source.find("ctx").unwrap();
        let diag = Diagnostic::warning("shared context")
            .with_code("CTX1001")
            .with_primary(Span::new(start, start + 3), "here")
            .with_help("scope it");
        let out = plain(|| DiagnosticFormatter::new(source).with_file_name("A.cs").format(&diag));

        assert!(out.starts_with("warning[CTX1001]: shared context\n"), "{out}");
        assert!(out.contains("--> A.cs:3:31"), "{out}");
        assert!(out.contains("3 |     void M() { Task.Run(() => ctx.Save()); }"), "{out}");
        let underline = out.lines().find(|l| l.contains('^')).unwrap();
        assert_eq!(underline.find('^'), Some(36));
        assert!(underline.ends_with("^^^ here"));
        assert!(out.contains("= help: scope it"));
    }

    #[test]
    fn diagnostic_without_labels_has_no_source() {
        let diag = Diagnostic::error("cannot read file").with_note("permission denied");
        let out = plain(|| DiagnosticFormatter::new("").format(&diag));
        assert_eq!(out, "error: cannot read file\n    = note: permission denied\n");
    }
}
