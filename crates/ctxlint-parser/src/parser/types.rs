// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type syntax and the lookaheads that decide whether a type starts here.

use ctxlint_ast::token::TokenKind;
use ctxlint_ast::TypeSyntax;

use super::{ParseError, Parser};

impl Parser {
    /// Parse a type: `Name`, `A.B.C`, `List<T>`, `int[]`, `T?`, `(A, B)`.
    ///
    /// Never records errors or allocates nodes, so callers may use it
    /// speculatively and rewind `pos`.
    pub(super) fn parse_type(&mut self) -> Result<TypeSyntax, ParseError> {
        let mut ty = if self.check(&TokenKind::LParen) {
            self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
            TypeSyntax::simple("(tuple)")
        } else {
            let mut name = match self.current_kind().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    name
                }
                other => return Err(ParseError::expected("type", &other, self.current().span)),
            };
            while self.check(&TokenKind::Dot) && matches!(self.peek(1), TokenKind::Ident(_)) {
                self.advance();
                name.push('.');
                name.push_str(&self.expect_ident()?);
            }
            let args = if self.check(&TokenKind::Lt) {
                self.parse_type_args()?
            } else {
                Vec::new()
            };
            TypeSyntax::generic(name, args)
        };

        loop {
            if self.check(&TokenKind::Question) {
                self.advance();
            } else if self.check(&TokenKind::LBracket)
                && matches!(self.peek(1), TokenKind::RBracket | TokenKind::Comma)
            {
                self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket);
                ty.name.push_str("[]");
            } else {
                break;
            }
        }
        Ok(ty)
    }

    /// `<T1, T2>`
    pub(super) fn parse_type_args(&mut self) -> Result<Vec<TypeSyntax>, ParseError> {
        self.expect(&TokenKind::Lt)?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Gt)?;
        Ok(args)
    }

    /// `<T, in U, out V>` on a declaration.
    pub(super) fn parse_type_params(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::Lt)?;
        let mut params = Vec::new();
        loop {
            if self.check(&TokenKind::In) || self.check_word("out") {
                self.advance();
            }
            params.push(self.expect_ident()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Gt)?;
        Ok(params)
    }

    /// Skip `where T : constraint` clauses up to the body.
    pub(super) fn skip_where_clauses(&mut self) {
        while self.check_word("where") {
            while !self.at_end()
                && !matches!(
                    self.current_kind(),
                    TokenKind::LBrace | TokenKind::Semi | TokenKind::FatArrow
                )
            {
                if self.check(&TokenKind::LParen) {
                    self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
                } else {
                    self.advance();
                }
            }
        }
    }

    /// At `<`: is this a generic argument list followed by a call or member
    /// access, rather than a comparison?
    pub(super) fn looks_like_generic_call(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < self.tokens.len() {
            match &self.tokens[i].kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::LParen | TokenKind::Dot)
                        );
                    }
                }
                TokenKind::Ident(_)
                | TokenKind::Dot
                | TokenKind::Comma
                | TokenKind::Question
                | TokenKind::LBracket
                | TokenKind::RBracket => {}
                _ => return false,
            }
            i += 1;
        }
        false
    }

    /// Does a local declaration (`Type name =`, `var name`) start here?
    pub(super) fn looks_like_local_decl(&mut self) -> bool {
        let saved = self.pos;
        while matches!(self.current_kind(), TokenKind::Modifier("const")) {
            self.advance();
        }
        let result = if self.check(&TokenKind::Var) {
            matches!(self.peek(1), TokenKind::Ident(_))
        } else {
            self.parse_type().is_ok()
                && matches!(self.current_kind(), TokenKind::Ident(_))
                && matches!(
                    self.peek(1),
                    TokenKind::Eq | TokenKind::Semi | TokenKind::Comma | TokenKind::In
                )
        };
        self.pos = saved;
        result
    }
}
