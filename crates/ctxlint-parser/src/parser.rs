// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation.
//!
//! Recursive descent for declarations and statements, Pratt parsing for
//! binary operators. Nodes are pushed into the arena bottom-up.

mod decl;
mod expr;
mod stmt;
mod types;

use ctxlint_ast::token::{Token, TokenKind};
use ctxlint_ast::{NodeId, NodeKind, Span, SyntaxTree};

use crate::hints;

/// Maximum number of errors before stopping.
const MAX_ERRORS: usize = 20;

/// The parser state.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    tree: SyntaxTree,
}

/// Result of parsing, containing the tree and any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
            });
        }
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            tree: SyntaxTree::new(),
        }
    }

    /// Parse a whole compilation unit, collecting multiple errors.
    pub fn parse(mut self) -> ParseResult {
        let root = self.parse_compilation_unit();
        self.tree.set_root(root);
        ParseResult {
            tree: self.tree,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Error Handling
    // =========================================================================

    /// Record an error. Returns false once the error limit is reached.
    fn record_error(&mut self, error: ParseError) -> bool {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.errors.len() < MAX_ERRORS
    }

    fn too_many_errors(&self) -> bool {
        self.errors.len() >= MAX_ERRORS
    }

    /// Skip to a likely statement boundary. Always makes progress.
    fn synchronize_in_block(&mut self) {
        let start = self.pos;
        while !self.at_end() {
            match self.current_kind().clone() {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => break,
                TokenKind::LBrace => {
                    self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace);
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
        if self.pos == start && !self.at_end() && !self.check(&TokenKind::RBrace) {
            self.advance();
        }
    }

    /// Record an `Error` node spanning from `start` to the last consumed token.
    fn error_node(&mut self, start: usize) -> NodeId {
        let end = self.prev_end().max(start);
        self.tree.leaf(NodeKind::Error, Span::new(start, end))
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos - 1]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check for a contextual keyword lexed as an identifier (`try`, `where`).
    fn check_word(&self, word: &str) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(s) if s == word)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(ParseError::expected(
                kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::expected("a name", &other, self.current().span)),
        }
    }

    /// Start offset of the current token.
    fn start(&self) -> usize {
        self.current().span.start
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    /// Push a node whose span runs from `start` to the last consumed token.
    fn node(&mut self, kind: NodeKind, start: usize, children: Vec<NodeId>) -> NodeId {
        let span = Span::new(start, self.prev_end().max(start));
        self.tree.push(kind, span, children)
    }

    /// Skip a balanced `open ... close` group starting at the current token.
    fn skip_balanced(&mut self, open: &TokenKind, close: &TokenKind) {
        if !self.match_token(open) {
            return;
        }
        let mut depth = 1usize;
        while depth > 0 && !self.at_end() {
            if self.check(open) {
                depth += 1;
            } else if self.check(close) {
                depth -= 1;
            }
            self.advance();
        }
    }

    /// Skip `[Attribute(...)]` lists.
    fn skip_attributes(&mut self) {
        while self.check(&TokenKind::LBracket) {
            self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket);
        }
    }

    /// Index of the token matching the `(` at `open`, if any.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open) {
            match tok.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Semi | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => {
                    return None
                }
                _ => {}
            }
        }
        None
    }
}

// =========================================================================
// Parse Errors
// =========================================================================

/// A parse error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            message: message.into(),
            hint: None,
        }
    }

    pub fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        Self {
            span,
            message: format!("expected {}, found {}", expected, found.display_name()),
            hint: hints::for_expected(expected, found).map(String::from),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
