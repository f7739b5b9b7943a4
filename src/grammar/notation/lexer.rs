//! Logos-based lexer for the grammar notation
//!
//! Whitespace and `#` comments are skipped; everything else is a token.

use logos::Logos;
use std::ops::Range;

/// A token with its kind, text, and byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let kind = result.unwrap_or(TokenKind::Error);
        Some(Token {
            kind,
            text: self.inner.slice(),
            span: self.inner.span(),
        })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"@[A-Za-z_]+")]
    Directive,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"/([^/\\\n]|\\.)+/")]
    Regex,

    #[regex(r"-?[0-9]+")]
    Integer,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("|")]
    Pipe,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("?")]
    Question,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    /// Unrecognized input
    Error,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Directive => "directive",
            Self::Ident => "identifier",
            Self::String => "string",
            Self::Regex => "pattern",
            Self::Integer => "integer",
            Self::Colon => "':'",
            Self::Semicolon => "';'",
            Self::Pipe => "'|'",
            Self::Star => "'*'",
            Self::Plus => "'+'",
            Self::Question => "'?'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
            Self::Error => "invalid input",
        }
    }
}
