// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.

use ctxlint_ast::token::{Token, TokenKind};
use ctxlint_ast::Span;
use logos::Logos;
use thiserror::Error;

/// Raw token type for logos - literal values are parsed in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    // === Keywords ===
    #[token("using")]
    Using,
    #[token("namespace")]
    Namespace,
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("struct")]
    Struct,
    #[token("record")]
    Record,
    #[token("new")]
    New,
    #[token("var")]
    Var,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("foreach")]
    Foreach,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("while")]
    While,
    #[token("await")]
    Await,
    #[token("async")]
    Async,
    #[token("delegate")]
    Delegate,
    #[token("this")]
    This,
    #[token("base")]
    Base,
    #[token("null")]
    Null,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("public")]
    #[token("private")]
    #[token("protected")]
    #[token("internal")]
    #[token("static")]
    #[token("readonly")]
    #[token("override")]
    #[token("virtual")]
    #[token("sealed")]
    #[token("abstract")]
    #[token("partial")]
    #[token("const")]
    #[token("extern")]
    #[token("volatile")]
    #[token("unsafe")]
    #[token("required")]
    Modifier,

    // === Operators (longer first) ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QuestionQuestion,
    #[token("?.")]
    QuestionDot,
    #[token("=>")]
    FatArrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    // === Trivia ===
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,
    // Preprocessor lines (#region, #nullable enable, ...)
    #[regex(r"#[a-z][^\n]*", logos::skip)]
    Directive,

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F_]+([uU][lL]?|[lL][uU]?)?")]
    HexInt,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fFdDmM]?")]
    #[regex(r"[0-9][0-9_]*[fFdDmM]")]
    Float,
    #[regex(r"[0-9][0-9_]*([uU][lL]?|[lL][uU]?)?")]
    DecInt,
    #[regex(r"'([^'\\]|\\.)'")]
    Char,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,
    #[regex(r#"@"([^"]|"")*""#)]
    VerbatimString,
    #[regex(r#"\$"([^"\\\n]|\\.)*""#)]
    #[regex(r#"(\$@|@\$)"([^"]|"")*""#)]
    InterpolatedString,

    // === Identifier (after keywords) ===
    #[regex(r"@?[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Skip a block comment. C# comments do not nest; an unterminated one runs
/// to the end of input.
fn block_comment(lexer: &mut logos::Lexer<RawToken>) -> logos::Skip {
    let remainder = lexer.remainder();
    let consumed = remainder.find("*/").map_or(remainder.len(), |end| end + 2);
    lexer.bump(consumed);
    logos::Skip
}

const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "internal",
    "static",
    "readonly",
    "override",
    "virtual",
    "sealed",
    "abstract",
    "partial",
    "const",
    "extern",
    "volatile",
    "unsafe",
    "required",
];

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// The lexer for C# source code.
pub struct Lexer<'a> {
    source: &'a str,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, errors: Vec::new() }
    }

    /// Tokenize the entire source, collecting multiple errors.
    pub fn tokenize(&mut self) -> LexResult {
        let mut tokens = Vec::new();
        let mut logos_lexer = RawToken::lexer(self.source);

        while let Some(result) = logos_lexer.next() {
            if self.errors.len() >= MAX_ERRORS {
                break;
            }

            let span = logos_lexer.span();
            let slice = logos_lexer.slice();

            let kind = match result {
                Ok(raw) => match self.convert_token(raw, slice, span.start, span.end) {
                    Ok(kind) => kind,
                    Err(e) => {
                        self.errors.push(e);
                        continue;
                    }
                },
                Err(()) => {
                    let ch = self.source[span.start..].chars().next().unwrap_or('?');
                    self.errors.push(LexError::unexpected_char(ch, span.start));
                    continue;
                }
            };

            tokens.push(Token {
                kind,
                span: Span::new(span.start, span.end),
            });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(self.source.len(), self.source.len()),
        });

        LexResult {
            tokens,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Convert a raw logos token to our TokenKind, parsing literals.
    fn convert_token(
        &self,
        raw: RawToken,
        slice: &str,
        start: usize,
        end: usize,
    ) -> Result<TokenKind, LexError> {
        Ok(match raw {
            RawToken::Using => TokenKind::Using,
            RawToken::Namespace => TokenKind::Namespace,
            RawToken::Class => TokenKind::Class,
            RawToken::Interface => TokenKind::Interface,
            RawToken::Struct => TokenKind::Struct,
            RawToken::Record => TokenKind::Record,
            RawToken::New => TokenKind::New,
            RawToken::Var => TokenKind::Var,
            RawToken::Return => TokenKind::Return,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::Foreach => TokenKind::Foreach,
            RawToken::For => TokenKind::For,
            RawToken::In => TokenKind::In,
            RawToken::While => TokenKind::While,
            RawToken::Await => TokenKind::Await,
            RawToken::Async => TokenKind::Async,
            RawToken::Delegate => TokenKind::Delegate,
            RawToken::This => TokenKind::This,
            RawToken::Base => TokenKind::Base,
            RawToken::Null => TokenKind::Null,
            RawToken::Throw => TokenKind::Throw,
            RawToken::True => TokenKind::Bool(true),
            RawToken::False => TokenKind::Bool(false),
            RawToken::Modifier => match MODIFIERS.iter().copied().find(|m| *m == slice) {
                Some(m) => TokenKind::Modifier(m),
                None => TokenKind::Ident(slice.to_string()),
            },

            RawToken::EqEq => TokenKind::EqEq,
            RawToken::BangEq => TokenKind::BangEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::QuestionQuestion => TokenKind::QuestionQuestion,
            RawToken::QuestionDot => TokenKind::QuestionDot,
            RawToken::FatArrow => TokenKind::FatArrow,
            RawToken::PlusPlus => TokenKind::PlusPlus,
            RawToken::MinusMinus => TokenKind::MinusMinus,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Question => TokenKind::Question,
            RawToken::Dot => TokenKind::Dot,

            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Comma => TokenKind::Comma,

            // Skipped by logos callbacks; never produced.
            RawToken::LineComment | RawToken::BlockComment | RawToken::Directive => {
                return Err(LexError::unexpected_char('/', start));
            }

            RawToken::HexInt => {
                let digits: String = slice[2..]
                    .chars()
                    .filter(|c| c.is_ascii_hexdigit())
                    .collect();
                let value = i64::from_str_radix(&digits, 16)
                    .map_err(|_| LexError::invalid_number(start, end))?;
                TokenKind::Int(value)
            }
            RawToken::DecInt => {
                let digits: String = slice.chars().filter(|c| c.is_ascii_digit()).collect();
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| LexError::invalid_number(start, end))?;
                TokenKind::Int(value)
            }
            RawToken::Float => {
                let digits: String = slice
                    .chars()
                    .filter(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
                    .collect();
                let value = digits
                    .parse::<f64>()
                    .map_err(|_| LexError::invalid_number(start, end))?;
                TokenKind::Float(value)
            }
            RawToken::Char => {
                let inner = &slice[1..slice.len() - 1];
                let mut chars = inner.chars();
                let c = match chars.next() {
                    Some('\\') => parse_escape(&mut chars, start)?,
                    Some(c) => c,
                    None => return Err(LexError::invalid_escape(start)),
                };
                TokenKind::Char(c)
            }
            RawToken::String => TokenKind::String(parse_string(&slice[1..slice.len() - 1], start)?),
            RawToken::VerbatimString => {
                TokenKind::String(slice[2..slice.len() - 1].replace("\"\"", "\""))
            }
            RawToken::InterpolatedString => {
                // Holes are kept as raw text; the analyzer never looks inside strings.
                let open = slice.find('"').unwrap_or(0);
                TokenKind::String(slice[open + 1..slice.len() - 1].to_string())
            }
            RawToken::Ident => TokenKind::Ident(slice.trim_start_matches('@').to_string()),
        })
    }
}

/// Parse a regular string literal body, handling escape sequences.
fn parse_string(s: &str, pos: usize) -> Result<String, LexError> {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            result.push(parse_escape(&mut chars, pos)?);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

fn parse_escape(chars: &mut impl Iterator<Item = char>, pos: usize) -> Result<char, LexError> {
    match chars.next() {
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some('\\') => Ok('\\'),
        Some('0') => Ok('\0'),
        Some('\'') => Ok('\''),
        Some('"') => Ok('"'),
        Some('u') => {
            let hex: String = chars.take(4).collect();
            u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or(LexError::invalid_escape(pos))
        }
        _ => Err(LexError::invalid_escape(pos)),
    }
}

/// Result of lexing: tokens plus any errors found.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A lexer error with location and friendly message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LexError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl LexError {
    fn unexpected_char(ch: char, pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + ch.len_utf8()),
            message: format!("Unexpected character '{}'", ch),
            hint: None,
        }
    }

    fn invalid_escape(pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + 1),
            message: "Invalid escape sequence".to_string(),
            hint: Some("Valid: \\n \\r \\t \\\\ \\0 \\' \\\" \\uXXXX".to_string()),
        }
    }

    fn invalid_number(start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            message: "Invalid number".to_string(),
            hint: None,
        }
    }
}
