// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compilation units, namespaces, types and members.

use ctxlint_ast::token::TokenKind;
use ctxlint_ast::{NodeId, NodeKind, Span, TypeSyntax};

use super::{ParseError, Parser};

impl Parser {
    pub(super) fn parse_compilation_unit(&mut self) -> NodeId {
        let items = self.parse_items(false);
        let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
        self.tree
            .push(NodeKind::CompilationUnit, Span::new(0, end), items)
    }

    /// Namespace-level items. Top-level statements are accepted too.
    fn parse_items(&mut self, nested: bool) -> Vec<NodeId> {
        let mut items = Vec::new();
        while !self.at_end() && !self.too_many_errors() {
            if nested && self.check(&TokenKind::RBrace) {
                break;
            }
            let start = self.start();
            if let Err(e) = self.parse_item(&mut items) {
                if !self.record_error(e) {
                    break;
                }
                self.synchronize_item();
                items.push(self.error_node(start));
            }
        }
        items
    }

    fn parse_item(&mut self, out: &mut Vec<NodeId>) -> Result<(), ParseError> {
        let start = self.start();
        if self.check(&TokenKind::Using) && self.using_is_directive() {
            out.push(self.parse_using_directive()?);
            return Ok(());
        }
        if self.check(&TokenKind::Namespace) {
            out.push(self.parse_namespace()?);
            return Ok(());
        }
        if self.check(&TokenKind::LBracket) || self.at_declaration_modifier() {
            self.skip_attributes();
            self.skip_modifiers();
            if !self.at_type_keyword() {
                return Err(ParseError::expected(
                    "declaration",
                    self.current_kind(),
                    self.current().span,
                ));
            }
        }
        if self.at_type_keyword() {
            out.push(self.parse_type_decl(start)?);
            return Ok(());
        }
        self.parse_block_item(out)
    }

    /// Skip to the next top-level item. Always makes progress.
    fn synchronize_item(&mut self) {
        let start = self.pos;
        while !self.at_end() {
            match self.current_kind().clone() {
                TokenKind::Semi => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace => {
                    self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace);
                    break;
                }
                TokenKind::Using | TokenKind::Namespace | TokenKind::Class
                    if self.pos != start =>
                {
                    break
                }
                TokenKind::RBrace => break,
                _ => {
                    self.advance();
                }
            }
        }
        if self.pos == start && !self.at_end() {
            self.advance();
        }
    }

    /// `using X.Y;`, `using static X;` or `using A = X.Y;` rather than a
    /// using statement or declaration.
    fn using_is_directive(&self) -> bool {
        if matches!(self.peek(1), TokenKind::Modifier("static")) {
            return true;
        }
        let mut i = 1;
        if !matches!(self.peek(i), TokenKind::Ident(_)) {
            return false;
        }
        i += 1;
        while matches!(self.peek(i), TokenKind::Dot) && matches!(self.peek(i + 1), TokenKind::Ident(_))
        {
            i += 2;
        }
        matches!(self.peek(i), TokenKind::Semi | TokenKind::Eq)
    }

    fn parse_using_directive(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Using)?;
        self.match_token(&TokenKind::Modifier("static"));
        let mut path = self.parse_dotted_name()?;
        if self.match_token(&TokenKind::Eq) {
            // Alias: keep the target.
            path = self.parse_type()?.to_string();
        }
        self.expect(&TokenKind::Semi)?;
        Ok(self.node(NodeKind::UsingDirective { path }, start, Vec::new()))
    }

    fn parse_namespace(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Namespace)?;
        let name = self.parse_dotted_name()?;
        let items = if self.match_token(&TokenKind::Semi) {
            // File-scoped: the rest of the file belongs to it.
            self.parse_items(false)
        } else {
            self.expect(&TokenKind::LBrace)?;
            let items = self.parse_items(true);
            self.expect(&TokenKind::RBrace)?;
            items
        };
        Ok(self.node(NodeKind::Namespace { name }, start, items))
    }

    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_ident()?;
        while self.match_token(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn at_declaration_modifier(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Modifier(_))
    }

    fn skip_modifiers(&mut self) {
        while self.at_declaration_modifier() {
            self.advance();
        }
    }

    fn at_type_keyword(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Class | TokenKind::Interface | TokenKind::Struct | TokenKind::Record
        )
    }

    /// `class Name<T> : Base, IFace where T : new() { members }`
    fn parse_type_decl(&mut self, start: usize) -> Result<NodeId, ParseError> {
        if self.match_token(&TokenKind::Record) {
            // `record class` / `record struct`
            if self.check(&TokenKind::Class) || self.check(&TokenKind::Struct) {
                self.advance();
            }
        } else {
            self.advance();
        }
        let name = self.expect_ident()?;
        let type_params = if self.check(&TokenKind::Lt) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        if self.check(&TokenKind::LParen) {
            // Primary constructor parameters.
            self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
        }

        let mut bases = Vec::new();
        if self.match_token(&TokenKind::Colon) {
            loop {
                bases.push(self.parse_type()?);
                if self.check(&TokenKind::LParen) {
                    self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.skip_where_clauses();

        let members = if self.match_token(&TokenKind::Semi) {
            Vec::new()
        } else {
            self.expect(&TokenKind::LBrace)?;
            let members = self.parse_members(&name);
            self.expect(&TokenKind::RBrace)?;
            self.match_token(&TokenKind::Semi);
            members
        };

        Ok(self.node(
            NodeKind::Class {
                name,
                type_params,
                bases,
            },
            start,
            members,
        ))
    }

    fn parse_members(&mut self, class_name: &str) -> Vec<NodeId> {
        let mut members = Vec::new();
        while !self.at_end() && !self.check(&TokenKind::RBrace) && !self.too_many_errors() {
            let start = self.start();
            if let Err(e) = self.parse_member(class_name, &mut members) {
                if !self.record_error(e) {
                    break;
                }
                self.synchronize_in_block();
                members.push(self.error_node(start));
            }
        }
        members
    }

    fn parse_member(&mut self, class_name: &str, out: &mut Vec<NodeId>) -> Result<(), ParseError> {
        let start = self.start();
        self.skip_attributes();
        let mut is_async = false;
        loop {
            match self.current_kind().clone() {
                TokenKind::Modifier(_) => {}
                TokenKind::Async => is_async = true,
                _ => break,
            }
            self.advance();
        }

        if self.at_type_keyword() {
            out.push(self.parse_type_decl(start)?);
            return Ok(());
        }

        if self.check_word(class_name) && matches!(self.peek(1), TokenKind::LParen) {
            out.push(self.parse_constructor(start)?);
            return Ok(());
        }

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;

        match self.current_kind().clone() {
            TokenKind::LParen | TokenKind::Lt => {
                out.push(self.parse_method(start, ty, name, is_async)?);
            }
            TokenKind::LBrace => {
                self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace);
                let mut children = Vec::new();
                if self.match_token(&TokenKind::Eq) {
                    children.push(self.parse_expr()?);
                    self.expect(&TokenKind::Semi)?;
                }
                out.push(self.node(NodeKind::Property { name, ty }, start, children));
            }
            TokenKind::FatArrow => {
                self.advance();
                let body = self.parse_expr()?;
                self.expect(&TokenKind::Semi)?;
                out.push(self.node(NodeKind::Property { name, ty }, start, vec![body]));
            }
            TokenKind::Eq | TokenKind::Semi | TokenKind::Comma => {
                self.parse_field_declarators(start, ty, name, out)?;
            }
            other => {
                return Err(ParseError::expected("member", &other, self.current().span));
            }
        }
        Ok(())
    }

    fn parse_field_declarators(
        &mut self,
        start: usize,
        ty: TypeSyntax,
        first: String,
        out: &mut Vec<NodeId>,
    ) -> Result<(), ParseError> {
        let mut name = first;
        loop {
            let mut children = Vec::new();
            if self.match_token(&TokenKind::Eq) {
                children.push(self.parse_expr()?);
            }
            out.push(self.node(
                NodeKind::Field {
                    name,
                    ty: ty.clone(),
                },
                start,
                children,
            ));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            name = self.expect_ident()?;
        }
        self.expect(&TokenKind::Semi)?;
        Ok(())
    }

    fn parse_method(
        &mut self,
        start: usize,
        ret: TypeSyntax,
        name: String,
        is_async: bool,
    ) -> Result<NodeId, ParseError> {
        let type_params = if self.check(&TokenKind::Lt) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let mut children = self.parse_param_list(false)?;
        self.skip_where_clauses();
        if let Some(body) = self.parse_function_body()? {
            children.push(body);
        }
        Ok(self.node(
            NodeKind::Method {
                name,
                ret,
                type_params,
                is_async,
            },
            start,
            children,
        ))
    }

    fn parse_constructor(&mut self, start: usize) -> Result<NodeId, ParseError> {
        let name = self.expect_ident()?;
        let mut children = self.parse_param_list(false)?;
        if self.match_token(&TokenKind::Colon) {
            // `: base(...)` / `: this(...)`
            self.advance();
            self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
        }
        if let Some(body) = self.parse_function_body()? {
            children.push(body);
        }
        Ok(self.node(NodeKind::Constructor { name }, start, children))
    }

    /// `{ ... }`, `=> expr;` or `;`.
    fn parse_function_body(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_block().map(Some);
        }
        if self.match_token(&TokenKind::FatArrow) {
            let body = self.parse_expr()?;
            self.expect(&TokenKind::Semi)?;
            return Ok(Some(body));
        }
        self.expect(&TokenKind::Semi)?;
        Ok(None)
    }

    /// `(T a, ref U b = default)`. Lambda parameter lists may omit types.
    pub(super) fn parse_param_list(
        &mut self,
        allow_untyped: bool,
    ) -> Result<Vec<NodeId>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            let start = self.start();
            self.skip_attributes();
            while self.check(&TokenKind::This)
                || self.check(&TokenKind::In)
                || self.check_word("ref")
                || self.check_word("out")
                || self.check_word("params")
            {
                self.advance();
            }

            let untyped = allow_untyped
                && matches!(self.current_kind(), TokenKind::Ident(_))
                && matches!(self.peek(1), TokenKind::Comma | TokenKind::RParen);
            let ty = if untyped {
                None
            } else {
                Some(self.parse_type()?)
            };
            let name = self.expect_ident()?;
            if self.match_token(&TokenKind::Eq) {
                self.skip_default_value();
            }
            params.push(self.node(NodeKind::Parameter { name, ty }, start, Vec::new()));

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    fn skip_default_value(&mut self) {
        while !self.at_end() && !matches!(self.current_kind(), TokenKind::Comma | TokenKind::RParen)
        {
            if self.check(&TokenKind::LParen) {
                self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen);
            } else {
                self.advance();
            }
        }
    }
}
