//! Recursive descent parser for the grammar notation
//!
//! ```text
//! File        = (Directive | Rule)*
//! Directive   = '@' name Arg*
//! Rule        = Ident ':' Alternation ';'
//! Alternation = Sequence ('|' Sequence)*
//! Sequence    = Postfix*
//! Postfix     = Primary ('*' | '+' | '?')*
//! Primary     = String | Pattern | Ident | Builtin '(' Args ')' | '(' Alternation ')'
//! ```

use smol_str::SmolStr;

use super::lexer::{Token, TokenKind, tokenize};
use crate::base::{LineIndex, TextSize};
use crate::grammar::expr::{self, RuleExpr};
use crate::grammar::{Grammar, GrammarError};

const BUILTINS: &[&str] = &[
    "token",
    "prec",
    "prec_left",
    "prec_right",
    "nested",
    "delimited",
    "quoted",
    "blank",
];

/// Parse grammar notation into a `Grammar`.
pub fn parse_notation(input: &str) -> Result<Grammar, GrammarError> {
    let tokens = tokenize(input);
    let mut parser = Parser::new(input, &tokens);
    parser.parse_file()?;
    Ok(parser.finish())
}

/// The parser state
struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token<'a>],
    pos: usize,
    grammar: Grammar,
    start_set: bool,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: &'a [Token<'a>]) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
            grammar: Grammar::new("grammar"),
            start_set: false,
        }
    }

    fn finish(mut self) -> Grammar {
        if !self.start_set {
            // Same convention as tree-sitter: the first rule is the start rule
            let first = self.grammar.rules().next().map(|(name, _)| name.clone());
            if let Some(first) = first {
                self.grammar.set_start(first);
            }
        }
        self.grammar
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// A rule header `name :` starts at the current token.
    fn at_rule_start(&self) -> bool {
        self.at(TokenKind::Ident) && self.nth_kind(1) == Some(TokenKind::Colon)
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> &'a Token<'a> {
        let token = &self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token<'a>, GrammarError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {}", kind.describe())))
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&self, message: impl Into<String>) -> GrammarError {
        let offset = self
            .current()
            .map(|t| t.span.start)
            .unwrap_or(self.input.len());
        let position = LineIndex::new(self.input).position(TextSize::new(offset as u32));
        let found = match self.current() {
            Some(token) => format!("`{}`", token.text),
            None => "end of input".to_string(),
        };
        GrammarError::Notation {
            line: position.line + 1,
            column: position.column + 1,
            message: format!("{}, found {}", message.into(), found),
        }
    }

    // =========================================================================
    // Grammar rules
    // =========================================================================

    /// File = (Directive | Rule)*
    fn parse_file(&mut self) -> Result<(), GrammarError> {
        while !self.at_eof() {
            match self.current_kind() {
                Some(TokenKind::Directive) => self.parse_directive()?,
                Some(TokenKind::Ident) => self.parse_rule()?,
                _ => return Err(self.error("expected a rule or a directive")),
            }
        }
        Ok(())
    }

    /// Directive = '@' name Arg*
    fn parse_directive(&mut self) -> Result<(), GrammarError> {
        let directive = self.bump();
        let name = &directive.text[1..];
        match name {
            "name" => {
                let value = self.parse_name_or_string()?;
                self.grammar.set_name(value);
            }
            "start" => {
                let value = self.expect(TokenKind::Ident)?.text;
                self.grammar.set_start(value);
                self.start_set = true;
            }
            "word" => {
                let value = self.expect(TokenKind::Ident)?.text;
                self.grammar.set_word(value);
            }
            "extras" => {
                for name in self.parse_ident_list() {
                    self.grammar.mark_extra(name);
                }
            }
            "hidden" => {
                for name in self.parse_ident_list() {
                    self.grammar.mark_hidden(name);
                }
            }
            "sync" => {
                while self.at(TokenKind::String) {
                    let value = self.parse_string()?;
                    self.grammar.add_sync(value);
                }
            }
            "conflicts" => {
                while self.eat(TokenKind::LParen) {
                    let mut set = Vec::new();
                    while self.at(TokenKind::Ident) {
                        set.push(SmolStr::new(self.bump().text));
                    }
                    self.expect(TokenKind::RParen)?;
                    self.grammar.add_conflict(set);
                }
            }
            "end_markers" => {
                let mut markers = Vec::new();
                while self.at(TokenKind::String) {
                    markers.extend(self.parse_string()?.chars());
                }
                self.grammar.set_end_markers(markers);
            }
            _ => {
                self.pos -= 1;
                return Err(self.error(format!("unknown directive `@{}`", name)));
            }
        }
        Ok(())
    }

    fn parse_ident_list(&mut self) -> Vec<&'a str> {
        let mut names = Vec::new();
        while self.at(TokenKind::Ident) && !self.at_rule_start() {
            names.push(self.bump().text);
        }
        names
    }

    fn parse_name_or_string(&mut self) -> Result<SmolStr, GrammarError> {
        if self.at(TokenKind::String) {
            self.parse_string()
        } else {
            Ok(SmolStr::new(self.expect(TokenKind::Ident)?.text))
        }
    }

    /// Rule = Ident ':' Alternation ';'
    fn parse_rule(&mut self) -> Result<(), GrammarError> {
        let name = self.expect(TokenKind::Ident)?;
        if self.grammar.rule(name.text).is_some() {
            self.pos -= 1;
            return Err(self.error(format!("rule `{}` is defined twice", name.text)));
        }
        self.expect(TokenKind::Colon)?;
        let body = self.parse_alternation()?;
        self.expect(TokenKind::Semicolon)?;
        self.grammar.define(name.text, body)?;
        Ok(())
    }

    /// Alternation = Sequence ('|' Sequence)*
    fn parse_alternation(&mut self) -> Result<RuleExpr, GrammarError> {
        let mut alternatives = vec![self.parse_sequence()?];
        while self.eat(TokenKind::Pipe) {
            alternatives.push(self.parse_sequence()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.pop().unwrap_or(RuleExpr::Blank)
        } else {
            RuleExpr::Choice(alternatives)
        })
    }

    /// Sequence = Postfix*
    fn parse_sequence(&mut self) -> Result<RuleExpr, GrammarError> {
        let mut items = Vec::new();
        while self.at_primary_start() {
            items.push(self.parse_postfix()?);
        }
        Ok(match items.len() {
            0 => RuleExpr::Blank,
            1 => items.pop().unwrap_or(RuleExpr::Blank),
            _ => RuleExpr::Seq(items),
        })
    }

    fn at_primary_start(&self) -> bool {
        match self.current_kind() {
            Some(TokenKind::String | TokenKind::Regex | TokenKind::LParen) => true,
            Some(TokenKind::Ident) => !self.at_rule_start(),
            _ => false,
        }
    }

    /// Postfix = Primary ('*' | '+' | '?')*
    fn parse_postfix(&mut self) -> Result<RuleExpr, GrammarError> {
        let mut expr = self.parse_primary()?;
        loop {
            expr = if self.eat(TokenKind::Star) {
                expr::repeat(expr)
            } else if self.eat(TokenKind::Plus) {
                expr::repeat1(expr)
            } else if self.eat(TokenKind::Question) {
                expr::optional(expr)
            } else {
                return Ok(expr);
            };
        }
    }

    /// Primary = String | Pattern | Ident | Builtin '(' Args ')' | '(' Alternation ')'
    fn parse_primary(&mut self) -> Result<RuleExpr, GrammarError> {
        match self.current_kind() {
            Some(TokenKind::String) => Ok(RuleExpr::Literal(self.parse_string()?)),
            Some(TokenKind::Regex) => {
                let text = self.bump().text;
                Ok(RuleExpr::Pattern(unescape_pattern(&text[1..text.len() - 1])))
            }
            Some(TokenKind::LParen) => {
                self.bump();
                let inner = self.parse_alternation()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::Ident) => {
                let name = self.bump().text;
                if BUILTINS.contains(&name) && self.at(TokenKind::LParen) {
                    self.parse_builtin(name)
                } else {
                    Ok(RuleExpr::Reference(SmolStr::new(name)))
                }
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    /// Builtin '(' Args ')'
    fn parse_builtin(&mut self, name: &str) -> Result<RuleExpr, GrammarError> {
        self.expect(TokenKind::LParen)?;
        let expr = match name {
            "blank" => RuleExpr::Blank,
            "token" => expr::token(self.parse_alternation()?),
            "prec" | "prec_left" | "prec_right" => {
                let level = self.parse_integer()?;
                self.expect(TokenKind::Comma)?;
                let inner = self.parse_alternation()?;
                match name {
                    "prec_left" => expr::prec_left(level, inner),
                    "prec_right" => expr::prec_right(level, inner),
                    _ => expr::prec(level, inner),
                }
            }
            "nested" | "delimited" | "quoted" => {
                let first = self.parse_string()?;
                self.expect(TokenKind::Comma)?;
                let second = self.parse_string()?;
                match name {
                    "nested" => expr::nested(first, second),
                    "quoted" => expr::quoted(first, second),
                    _ => expr::delimited(first, second),
                }
            }
            _ => return Err(self.error(format!("unknown builtin `{}`", name))),
        };
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_integer(&mut self) -> Result<i32, GrammarError> {
        let token = self.expect(TokenKind::Integer)?;
        match token.text.parse() {
            Ok(level) => Ok(level),
            Err(_) => {
                self.pos -= 1;
                Err(self.error("integer out of range"))
            }
        }
    }

    fn parse_string(&mut self) -> Result<SmolStr, GrammarError> {
        let token = self.expect(TokenKind::String)?;
        match unescape_string(&token.text[1..token.text.len() - 1]) {
            Some(value) => Ok(value),
            None => {
                self.pos -= 1;
                Err(self.error("invalid escape sequence"))
            }
        }
    }
}

/// Resolve `\n`, `\t`, `\r`, `\0`, `\\`, `\"`, `\xHH` and `\u{...}` escapes.
fn unescape_string(text: &str) -> Option<SmolStr> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                let value = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(value)?);
            }
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let value = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(value)?);
            }
            _ => return None,
        }
    }
    Some(SmolStr::new(out))
}

/// Patterns keep regex escapes as written; only `\/` is unescaped.
fn unescape_pattern(text: &str) -> SmolStr {
    SmolStr::new(text.replace("\\/", "/"))
}
