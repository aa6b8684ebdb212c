// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Token definitions for the lexer.

use crate::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),
    Char(char),
    Bool(bool),

    // Identifier
    Ident(String),

    // Keywords
    Using,
    Namespace,
    Class,
    Interface,
    Struct,
    Record,
    New,
    Var,
    Return,
    If,
    Else,
    Foreach,
    For,
    In,
    While,
    Await,
    Async,
    Delegate,
    This,
    Base,
    Null,
    Throw,
    /// Declaration modifiers (`public`, `static`, `readonly`, ...).
    Modifier(&'static str),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    Question,
    QuestionQuestion,
    QuestionDot,
    FatArrow,
    Dot,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,

    // Delimiters
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semi,
    Comma,

    // Special
    Eof,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Int(_) | TokenKind::Float(_) => "a number",
            TokenKind::String(_) => "a string",
            TokenKind::Char(_) => "a character",
            TokenKind::Bool(_) => "'true' or 'false'",
            TokenKind::Ident(_) => "a name",

            TokenKind::Using => "'using'",
            TokenKind::Namespace => "'namespace'",
            TokenKind::Class => "'class'",
            TokenKind::Interface => "'interface'",
            TokenKind::Struct => "'struct'",
            TokenKind::Record => "'record'",
            TokenKind::New => "'new'",
            TokenKind::Var => "'var'",
            TokenKind::Return => "'return'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Foreach => "'foreach'",
            TokenKind::For => "'for'",
            TokenKind::In => "'in'",
            TokenKind::While => "'while'",
            TokenKind::Await => "'await'",
            TokenKind::Async => "'async'",
            TokenKind::Delegate => "'delegate'",
            TokenKind::This => "'this'",
            TokenKind::Base => "'base'",
            TokenKind::Null => "'null'",
            TokenKind::Throw => "'throw'",
            TokenKind::Modifier(_) => "a modifier",

            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Question => "'?'",
            TokenKind::QuestionQuestion => "'??'",
            TokenKind::QuestionDot => "'?.'",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Dot => "'.'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",

            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",

            TokenKind::Eof => "end of file",
        }
    }
}
