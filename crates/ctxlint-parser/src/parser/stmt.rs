// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statements and blocks.

use ctxlint_ast::token::TokenKind;
use ctxlint_ast::{NodeId, NodeKind};

use super::{ParseError, Parser};

impl Parser {
    pub(super) fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() && !self.too_many_errors() {
            let item_start = self.start();
            if let Err(e) = self.parse_block_item(&mut stmts) {
                if !self.record_error(e) {
                    break;
                }
                self.synchronize_in_block();
                stmts.push(self.error_node(item_start));
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(self.node(NodeKind::Block, start, stmts))
    }

    /// A statement or local declaration inside a block.
    pub(super) fn parse_block_item(&mut self, out: &mut Vec<NodeId>) -> Result<(), ParseError> {
        let start = self.start();

        // `using var x = ...;` / `await using var x = ...;`
        let await_using = self.check(&TokenKind::Await) && matches!(self.peek(1), TokenKind::Using);
        if await_using || (self.check(&TokenKind::Using) && !matches!(self.peek(1), TokenKind::LParen))
        {
            if await_using {
                self.advance();
            }
            self.advance();
            let decls = self.parse_local_decls(start, true)?;
            self.expect(&TokenKind::Semi)?;
            out.extend(decls);
            return Ok(());
        }

        if self.looks_like_local_decl() {
            let decls = self.parse_local_decls(start, false)?;
            self.expect(&TokenKind::Semi)?;
            out.extend(decls);
            return Ok(());
        }

        out.push(self.parse_stmt()?);
        Ok(())
    }

    /// `[const] Type a = e, b;` without the trailing `;`. One node per declarator.
    fn parse_local_decls(&mut self, start: usize, is_using: bool) -> Result<Vec<NodeId>, ParseError> {
        while self.check(&TokenKind::Modifier("const")) {
            self.advance();
        }
        let ty = if self.match_token(&TokenKind::Var) {
            None
        } else {
            Some(self.parse_type()?)
        };

        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let mut children = Vec::new();
            if self.match_token(&TokenKind::Eq) {
                children.push(self.parse_expr()?);
            }
            decls.push(self.node(
                NodeKind::LocalDecl {
                    name,
                    ty: ty.clone(),
                    is_using,
                },
                start,
                children,
            ));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(decls)
    }

    pub(super) fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        match self.current_kind().clone() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Semi => {
                self.advance();
                Ok(self.node(NodeKind::Empty, start, Vec::new()))
            }
            TokenKind::Return | TokenKind::Throw => {
                let kind = if self.check(&TokenKind::Return) {
                    NodeKind::Return
                } else {
                    NodeKind::Throw
                };
                self.advance();
                let mut children = Vec::new();
                if !self.check(&TokenKind::Semi) {
                    children.push(self.parse_expr()?);
                }
                self.expect(&TokenKind::Semi)?;
                Ok(self.node(kind, start, children))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Foreach => self.parse_foreach(start),
            TokenKind::Await if matches!(self.peek(1), TokenKind::Foreach) => {
                self.advance();
                self.parse_foreach(start)
            }
            TokenKind::For => self.parse_for(),
            TokenKind::While => {
                self.advance();
                self.expect(&TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                let body = self.parse_stmt()?;
                Ok(self.node(NodeKind::While, start, vec![cond, body]))
            }
            TokenKind::Using => self.parse_using_stmt(),
            TokenKind::Ident(word) if word == "try" && matches!(self.peek(1), TokenKind::LBrace) => {
                self.parse_try()
            }
            TokenKind::Ident(word)
                if (word == "break" || word == "continue")
                    && matches!(self.peek(1), TokenKind::Semi) =>
            {
                self.advance();
                self.advance();
                Ok(self.node(NodeKind::Empty, start, Vec::new()))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::Semi)?;
                Ok(self.node(NodeKind::ExprStmt, start, vec![expr]))
            }
        }
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let mut children = vec![cond, self.parse_stmt()?];
        if self.match_token(&TokenKind::Else) {
            children.push(self.parse_stmt()?);
        }
        Ok(self.node(NodeKind::If, start, children))
    }

    /// `foreach (var x in xs) body`; `start` covers a leading `await`.
    fn parse_foreach(&mut self, start: usize) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::Foreach)?;
        self.expect(&TokenKind::LParen)?;
        let ty = if self.match_token(&TokenKind::Var) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let var = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let iterable = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        Ok(self.node(NodeKind::ForEach { var, ty }, start, vec![iterable, body]))
    }

    fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LParen)?;

        let init_start = self.start();
        let init = if self.check(&TokenKind::Semi) {
            self.node(NodeKind::Empty, init_start, Vec::new())
        } else if self.looks_like_local_decl() {
            let mut decls = self.parse_local_decls(init_start, false)?;
            if decls.len() == 1 {
                decls.remove(0)
            } else {
                self.node(NodeKind::Block, init_start, decls)
            }
        } else {
            let expr = self.parse_expr()?;
            self.node(NodeKind::ExprStmt, init_start, vec![expr])
        };
        self.expect(&TokenKind::Semi)?;

        let cond = self.parse_optional_expr(&TokenKind::Semi)?;
        self.expect(&TokenKind::Semi)?;
        let step = self.parse_optional_expr(&TokenKind::RParen)?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        Ok(self.node(NodeKind::For, start, vec![init, cond, step, body]))
    }

    /// An expression, or `Empty` when `terminator` comes first.
    fn parse_optional_expr(&mut self, terminator: &TokenKind) -> Result<NodeId, ParseError> {
        let start = self.start();
        if self.check(terminator) {
            Ok(self.node(NodeKind::Empty, start, Vec::new()))
        } else {
            self.parse_expr()
        }
    }

    /// `using (resource) body`. Several declarators nest one statement per
    /// resource, outermost first.
    fn parse_using_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Using)?;
        self.expect(&TokenKind::LParen)?;
        let resources = if self.looks_like_local_decl() {
            let decl_start = self.start();
            self.parse_local_decls(decl_start, false)?
        } else {
            vec![self.parse_expr()?]
        };
        self.expect(&TokenKind::RParen)?;
        let mut body = self.parse_stmt()?;
        for resource in resources.into_iter().rev() {
            body = self.node(NodeKind::UsingStmt, start, vec![resource, body]);
        }
        Ok(body)
    }

    fn parse_try(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.advance();
        let mut children = vec![self.parse_block()?];

        while self.check_word("catch") {
            let catch_start = self.start();
            self.advance();
            let mut ty = None;
            let mut var = None;
            if self.match_token(&TokenKind::LParen) {
                ty = Some(self.parse_type()?);
                if let TokenKind::Ident(name) = self.current_kind().clone() {
                    self.advance();
                    var = Some(name);
                }
                self.expect(&TokenKind::RParen)?;
            }
            if self.check_word("when") {
                self.advance();
                self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
            }
            let block = self.parse_block()?;
            children.push(self.node(NodeKind::Catch { var, ty }, catch_start, vec![block]));
        }

        if self.check_word("finally") {
            self.advance();
            children.push(self.parse_block()?);
        }
        Ok(self.node(NodeKind::Try, start, children))
    }
}
