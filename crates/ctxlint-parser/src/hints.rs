// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter.

use ctxlint_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        ("';'", TokenKind::RBrace) => Some("the last statement in a block still needs ';'"),
        ("';'", _) => Some("statements and field declarations end with ';'"),

        ("'{'", _) => Some("blocks start with '{'"),
        ("'}'", TokenKind::Eof) => Some("every '{' needs a matching '}'"),
        ("'}'", _) => None,

        ("'('", _) => Some("this construct takes a parenthesized header"),
        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),
        ("'>'", _) => Some("close the type argument list with '>'"),
        ("'=>'", _) => Some("lambdas are written `x => body` or `(a, b) => body`"),

        ("expression", TokenKind::Semi) => Some("statement is incomplete"),
        ("expression", TokenKind::Eq) => Some("put the value after '='"),
        ("expression", _) => Some("try a value, variable, or method call"),

        ("a name", TokenKind::Int(_)) => Some("names can't start with a number"),
        ("a name", _) => Some("names start with a letter or '_'"),

        ("type", _) => Some("try a type like 'int', 'string', or a class name"),

        ("declaration", _) => Some("expected 'using', 'namespace', 'class' or a statement"),
        ("member", _) => Some("expected a field, property, method or constructor"),

        _ => None,
    }
}
