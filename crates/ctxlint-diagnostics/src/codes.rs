// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Code registry.
//!
//! Maps codes to titles, categories and a longer explanation for
//! `ctxlint explain <code>`.

use std::collections::HashMap;
use std::fmt;

pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
    pub explanation: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Design,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax"),
            ErrorCategory::Design => write!(f, "Design"),
        }
    }
}

macro_rules! register_codes {
    ($($code:literal => ($title:expr, $cat:expr, $text:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
                explanation: $text,
            });
        )*
        map
    }};
}

const CTX1001_TEXT: &str = "\
A DbContext is not thread-safe. Handing one instance to work that runs
concurrently (Task.Run, Task.Factory.StartNew, Parallel.For/ForEach,
Task.WhenAll, AsParallel) lets two threads use it at the same time, and a
context disposed by a `using` outside the work may be gone before the work
runs.

Create a context inside each unit of work, typically from
IDbContextFactory<TContext>, and dispose it there:

    await Task.Run(async () =>
    {
        await using var db = factory.CreateDbContext();
        await db.SaveChangesAsync();
    });";

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                // Lexer (E00xx)
                "E0001" => ("unexpected character", Syntax, "The lexer met a character it cannot start a token with."),
                "E0002" => ("invalid escape sequence", Syntax, "A string or character literal contains an unknown escape."),
                "E0003" => ("invalid number", Syntax, "A numeric literal is out of range or malformed."),

                // Parser (E01xx)
                "E0100" => ("syntax error", Syntax, "The parser could not make sense of the input at this point. The broken statement is replaced by an error node and parsing resumes at the next statement; findings in the rest of the file are still reported."),

                // Rules
                "CTX1001" => (ctxlint_analyzer::CTX1001.title, Design, CTX1001_TEXT),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    /// All codes, sorted.
    pub fn all(&self) -> Vec<&ErrorCodeInfo> {
        let mut all: Vec<_> = self.codes.values().collect();
        all.sort_by_key(|info| info.code);
        all
    }
}
