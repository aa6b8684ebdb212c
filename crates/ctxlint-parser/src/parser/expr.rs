// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expressions: assignment, conditionals, Pratt-parsed binary operators,
//! unary and postfix chains, lambdas and object creation.

use ctxlint_ast::token::TokenKind;
use ctxlint_ast::{BinOp, Literal, NodeId, NodeKind, TypeSyntax, UnaryOp};

use super::{ParseError, Parser};

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        if self.at_lambda_start() {
            return self.parse_lambda();
        }
        let start = self.start();
        let target = self.parse_conditional()?;

        let op = match self.current_kind().clone() {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            _ => return Ok(target),
        };
        self.advance();
        // Right-associative.
        let value = self.parse_expr()?;
        Ok(self.node(NodeKind::Assign { op }, start, vec![target, value]))
    }

    fn parse_conditional(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let cond = self.parse_binary(0)?;
        if !self.match_token(&TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_expr()?;
        self.expect(&TokenKind::Colon)?;
        let otherwise = self.parse_expr()?;
        Ok(self.node(NodeKind::Conditional, start, vec![cond, then, otherwise]))
    }

    /// Pratt loop over binary operators.
    fn parse_binary(&mut self, min_bp: u8) -> Result<NodeId, ParseError> {
        let start = self.start();
        let mut lhs = self.parse_unary()?;

        loop {
            let Some((op, l_bp, r_bp)) = infix_bp(self.current_kind()) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(r_bp)?;
            lhs = self.node(NodeKind::Binary { op }, start, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let op = match self.current_kind().clone() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::PlusPlus => Some(UnaryOp::PreIncrement),
            TokenKind::MinusMinus => Some(UnaryOp::PreDecrement),
            TokenKind::Await => {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(self.node(NodeKind::Await, start, vec![operand]));
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.node(NodeKind::Unary { op }, start, vec![operand]));
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary, start)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let literal = match self.current_kind().clone() {
            TokenKind::Int(v) => Some(Literal::Int(v)),
            TokenKind::Float(v) => Some(Literal::Float(v)),
            TokenKind::String(s) => Some(Literal::String(s)),
            TokenKind::Char(c) => Some(Literal::Char(c)),
            TokenKind::Bool(b) => Some(Literal::Bool(b)),
            TokenKind::Null => Some(Literal::Null),
            _ => None,
        };
        if let Some(lit) = literal {
            self.advance();
            return Ok(self.node(NodeKind::Literal(lit), start, Vec::new()));
        }

        match self.current_kind().clone() {
            TokenKind::This => {
                self.advance();
                Ok(self.node(NodeKind::This, start, Vec::new()))
            }
            TokenKind::Base => {
                self.advance();
                Ok(self.node(NodeKind::Base, start, Vec::new()))
            }
            TokenKind::Ident(name) => {
                self.advance();
                let type_args = self.parse_call_type_args()?;
                Ok(self.node(NodeKind::Ident { name, type_args }, start, Vec::new()))
            }
            TokenKind::LParen => {
                if self.at_lambda_start() {
                    return self.parse_lambda();
                }
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(self.node(NodeKind::Paren, start, vec![inner]))
            }
            TokenKind::New => self.parse_object_creation(),
            TokenKind::Async | TokenKind::Delegate => self.parse_lambda(),
            other => Err(ParseError::expected("expression", &other, self.current().span)),
        }
    }

    /// `<T>` on a generic method call, or nothing when `<` is a comparison.
    fn parse_call_type_args(&mut self) -> Result<Vec<TypeSyntax>, ParseError> {
        if self.check(&TokenKind::Lt) && self.looks_like_generic_call() {
            self.parse_type_args()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_postfix(&mut self, mut expr: NodeId, start: usize) -> Result<NodeId, ParseError> {
        loop {
            match self.current_kind().clone() {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let conditional = self.check(&TokenKind::QuestionDot);
                    self.advance();
                    let name = self.expect_ident()?;
                    let type_args = self.parse_call_type_args()?;
                    expr = self.node(
                        NodeKind::MemberAccess {
                            name,
                            type_args,
                            conditional,
                        },
                        start,
                        vec![expr],
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut children = vec![expr];
                    children.extend(self.parse_args(&TokenKind::RParen)?);
                    self.expect(&TokenKind::RParen)?;
                    expr = self.node(NodeKind::Invocation, start, children);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let mut children = vec![expr];
                    children.extend(self.parse_args(&TokenKind::RBracket)?);
                    self.expect(&TokenKind::RBracket)?;
                    expr = self.node(NodeKind::ElementAccess, start, children);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.check(&TokenKind::PlusPlus) {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    self.advance();
                    expr = self.node(NodeKind::Unary { op }, start, vec![expr]);
                }
                // Null-forgiving `x!`.
                TokenKind::Bang
                    if matches!(
                        self.peek(1),
                        TokenKind::Dot
                            | TokenKind::QuestionDot
                            | TokenKind::LParen
                            | TokenKind::LBracket
                            | TokenKind::RParen
                            | TokenKind::Semi
                            | TokenKind::Comma
                    ) =>
                {
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Comma-separated arguments up to `close`. Argument names and
    /// `ref`/`out`/`in` markers are dropped.
    fn parse_args(&mut self, close: &TokenKind) -> Result<Vec<NodeId>, ParseError> {
        let mut args = Vec::new();
        while !self.check(close) && !self.at_end() {
            if matches!(self.current_kind(), TokenKind::Ident(_))
                && matches!(self.peek(1), TokenKind::Colon)
            {
                self.advance();
                self.advance();
            }
            if self.check(&TokenKind::In) || self.check_word("ref") || self.check_word("out") {
                self.advance();
                // `out var x` / `out Type x` declares `x` in place.
                if self.check(&TokenKind::Var)
                    || (matches!(self.current_kind(), TokenKind::Ident(_))
                        && matches!(self.peek(1), TokenKind::Ident(_)))
                {
                    self.advance();
                }
            }
            args.push(self.parse_expr()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    // =========================================================================
    // Lambdas
    // =========================================================================

    /// `x =>`, `(..) =>`, `async ...` or `delegate`.
    fn at_lambda_start(&self) -> bool {
        let offset = usize::from(self.check(&TokenKind::Async));
        match self.peek(offset) {
            TokenKind::Delegate => true,
            TokenKind::Ident(_) => matches!(self.peek(offset + 1), TokenKind::FatArrow),
            TokenKind::LParen => self
                .matching_paren(self.pos + offset)
                .and_then(|close| self.tokens.get(close + 1))
                .is_some_and(|t| matches!(t.kind, TokenKind::FatArrow)),
            _ => false,
        }
    }

    fn parse_lambda(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let is_async = self.match_token(&TokenKind::Async);

        if self.match_token(&TokenKind::Delegate) {
            let mut children = if self.check(&TokenKind::LParen) {
                self.parse_param_list(false)?
            } else {
                Vec::new()
            };
            children.push(self.parse_block()?);
            return Ok(self.node(NodeKind::AnonymousMethod { is_async }, start, children));
        }

        let parenthesized = self.check(&TokenKind::LParen);
        let mut children = if parenthesized {
            self.parse_param_list(true)?
        } else {
            let param_start = self.start();
            let name = self.expect_ident()?;
            vec![self.node(NodeKind::Parameter { name, ty: None }, param_start, Vec::new())]
        };
        self.expect(&TokenKind::FatArrow)?;
        let body = if self.check(&TokenKind::LBrace) {
            self.parse_block()?
        } else {
            self.parse_expr()?
        };
        children.push(body);
        Ok(self.node(
            NodeKind::Lambda {
                is_async,
                parenthesized,
            },
            start,
            children,
        ))
    }

    // =========================================================================
    // Object Creation
    // =========================================================================

    /// `new T(args) { Init = v }`, `new T[n]`, `new[] { .. }`, `new { .. }`.
    fn parse_object_creation(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::New)?;

        let ty = if self.check(&TokenKind::LBracket) {
            self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket);
            TypeSyntax::simple("[]")
        } else if self.check(&TokenKind::LBrace) {
            TypeSyntax::simple("<anonymous>")
        } else if self.check(&TokenKind::LParen) {
            // Target-typed `new(...)`.
            TypeSyntax::simple("")
        } else {
            let mut ty = self.parse_type()?;
            if self.check(&TokenKind::LBracket) {
                self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket);
                ty.name.push_str("[]");
            }
            ty
        };

        let mut children = Vec::new();
        if self.match_token(&TokenKind::LParen) {
            children.extend(self.parse_args(&TokenKind::RParen)?);
            self.expect(&TokenKind::RParen)?;
        }
        if self.check(&TokenKind::LBrace) {
            children.extend(self.parse_initializer()?);
        }
        Ok(self.node(NodeKind::ObjectCreation { ty }, start, children))
    }

    /// `{ A = x, B = y }` or `{ x, y }`. Indexer and nested collection
    /// initializers contribute their values only.
    fn parse_initializer(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut values = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.check(&TokenKind::LBrace) {
                values.extend(self.parse_initializer()?);
            } else if self.check(&TokenKind::LBracket) {
                self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket);
                self.expect(&TokenKind::Eq)?;
                values.push(self.parse_expr()?);
            } else {
                values.push(self.parse_expr()?);
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(values)
    }
}

/// Binding powers for binary operators: (op, left, right).
fn infix_bp(kind: &TokenKind) -> Option<(BinOp, u8, u8)> {
    let entry = match kind {
        TokenKind::QuestionQuestion => (BinOp::Coalesce, 2, 1),
        TokenKind::PipePipe => (BinOp::Or, 3, 4),
        TokenKind::AmpAmp => (BinOp::And, 5, 6),
        TokenKind::EqEq => (BinOp::Eq, 7, 8),
        TokenKind::BangEq => (BinOp::Ne, 7, 8),
        TokenKind::Lt => (BinOp::Lt, 9, 10),
        TokenKind::Gt => (BinOp::Gt, 9, 10),
        TokenKind::LtEq => (BinOp::Le, 9, 10),
        TokenKind::GtEq => (BinOp::Ge, 9, 10),
        TokenKind::Plus => (BinOp::Add, 11, 12),
        TokenKind::Minus => (BinOp::Sub, 11, 12),
        TokenKind::Star => (BinOp::Mul, 13, 14),
        TokenKind::Slash => (BinOp::Div, 13, 14),
        TokenKind::Percent => (BinOp::Mod, 13, 14),
        _ => return None,
    };
    Some(entry)
}
