//! Lexer driven by a compiled lexical grammar.
//!
//! Scanning is context free: at every position all terminals are tried and
//! the longest match wins. On equal length a literal (or keyword) beats a
//! pattern, then the earlier declared token wins. Characters no terminal
//! matches are grouped into a single `UNKNOWN` token; the parser reports them.
//!
//! Concatenating the text of all tokens always reproduces the input.

mod scan;

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{Position, TextRange, TextSize};
use crate::compiler::{CompiledAutomaton, SyntaxKind};
use crate::parser::{ErrorCode, SyntaxError};

/// Constructs that can run off the end of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    NestedComment,
    DelimitedString,
    QuotedString,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NestedComment => "nested comment",
            Self::DelimitedString => "delimited string",
            Self::QuotedString => "quoted string",
        })
    }
}

/// A lexical error, attached to the token it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum LexError {
    #[error("Unterminated {construct}: `{open}` is never closed by `{close}`")]
    Unterminated {
        construct: Construct,
        open: SmolStr,
        close: SmolStr,
    },
}

impl LexError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unterminated {
                construct: Construct::NestedComment,
                ..
            } => ErrorCode::E0103,
            Self::Unterminated { .. } => ErrorCode::E0102,
        }
    }

    /// Diagnostic for a token starting at `offset`, pointing at the opening delimiter.
    pub fn to_syntax_error(&self, offset: TextSize) -> SyntaxError {
        let Self::Unterminated { open, close, .. } = self;
        SyntaxError::builder(self.code())
            .message(self.to_string())
            .range(TextRange::at(offset, TextSize::of(open.as_str())))
            .hint(format!("add `{}` to close it", close))
            .build()
    }
}

/// A lexical unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
    /// Line and column of the first character.
    pub start: Position,
    /// Extras (whitespace, comments, end markers) sit between significant tokens.
    pub is_extra: bool,
    pub error: Option<LexError>,
}

impl Token {
    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.range]
    }
}

/// Iterator over the tokens of `input`.
pub struct Lexer<'a> {
    input: &'a str,
    automaton: &'a CompiledAutomaton,
    offset: usize,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, automaton: &'a CompiledAutomaton) -> Self {
        Self {
            input,
            automaton,
            offset: 0,
            position: Position::default(),
        }
    }

    /// Resume lexing at a byte offset on a character boundary.
    pub fn at(input: &'a str, offset: usize, automaton: &'a CompiledAutomaton) -> Self {
        Self {
            input,
            automaton,
            offset,
            position: Position::default().advance(&input[..offset]),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.offset >= self.input.len() {
            return None;
        }
        let lexeme = lex_one(self.input, self.offset, self.automaton);
        let start = self.offset;
        self.offset += lexeme.len;
        let token = Token {
            kind: lexeme.kind,
            range: TextRange::new(size(start), size(self.offset)),
            start: self.position,
            is_extra: self.automaton.is_trivia(lexeme.kind),
            error: lexeme.error,
        };
        self.position = self.position.advance(&self.input[start..self.offset]);
        Some(token)
    }
}

/// The token starting at `offset`, or `None` at end of input.
pub fn next_token(input: &str, offset: TextSize, automaton: &CompiledAutomaton) -> Option<Token> {
    let offset = usize::from(offset);
    if offset > input.len() || !input.is_char_boundary(offset) {
        return None;
    }
    Lexer::at(input, offset, automaton).next()
}

/// All tokens of an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    tokens: Vec<Token>,
    len: TextSize,
}

impl Lexed {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Length of the input that was tokenized.
    pub fn text_len(&self) -> TextSize {
        self.len
    }

    pub fn significant(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| !token.is_extra)
    }

    pub fn errors(&self) -> impl Iterator<Item = SyntaxError> + '_ {
        self.tokens.iter().filter_map(|token| {
            token
                .error
                .as_ref()
                .map(|error| error.to_syntax_error(token.range.start()))
        })
    }
}

pub fn tokenize(input: &str, automaton: &CompiledAutomaton) -> Lexed {
    let tokens: Vec<Token> = Lexer::new(input, automaton).collect();
    tracing::trace!(tokens = tokens.len(), bytes = input.len(), "tokenized");
    Lexed {
        tokens,
        len: TextSize::of(input),
    }
}

fn size(offset: usize) -> TextSize {
    TextSize::new(offset as u32)
}

struct Lexeme {
    kind: SyntaxKind,
    len: usize,
    error: Option<LexError>,
}

/// Longest match at `offset`. Never returns an empty lexeme.
fn lex_one(input: &str, offset: usize, automaton: &CompiledAutomaton) -> Lexeme {
    let rest = &input[offset..];
    if starts_with_end_marker(rest, automaton) {
        return Lexeme {
            kind: SyntaxKind::END_MARKER,
            len: rest.len(),
            error: None,
        };
    }
    if let Some(lexeme) = longest_match(rest, automaton) {
        return lexeme;
    }

    // Group unmatched characters up to the next position where something matches
    let mut len = 0;
    for (index, c) in rest.char_indices() {
        let tail = &rest[index..];
        if index > 0
            && (starts_with_end_marker(tail, automaton) || longest_match(tail, automaton).is_some())
        {
            break;
        }
        len = index + c.len_utf8();
    }
    Lexeme {
        kind: SyntaxKind::UNKNOWN,
        len,
        error: None,
    }
}

fn starts_with_end_marker(rest: &str, automaton: &CompiledAutomaton) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| automaton.lexical().end_markers.contains(&c))
}

fn longest_match(rest: &str, automaton: &CompiledAutomaton) -> Option<Lexeme> {
    let lexical = automaton.lexical();
    let mut best: Option<(Lexeme, bool)> = None;
    for def in &lexical.tokens {
        if def.is_keyword {
            // Reached through the word token
            continue;
        }
        let Some(found) = scan::scan(&def.matcher, rest) else {
            continue;
        };
        let mut kind = def.kind;
        let mut literal = def.matcher.is_literal();
        if Some(def.kind) == lexical.word {
            if let Some(&keyword) = lexical.keywords.get(&rest[..found.len]) {
                kind = keyword;
                literal = true;
            }
        }
        let better = match &best {
            None => true,
            Some((current, current_literal)) => {
                found.len > current.len || (found.len == current.len && literal && !current_literal)
            }
        };
        if better {
            best = Some((
                Lexeme {
                    kind,
                    len: found.len,
                    error: found.error,
                },
                literal,
            ));
        }
    }
    best.map(|(lexeme, _)| lexeme)
}
