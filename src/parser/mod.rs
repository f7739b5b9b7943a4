//! Parsing engine: runs a compiled grammar over a token stream.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer → Tokens (significant + trivia)
//!     ↓
//! Engine (ordered choice, memoized) ⇄ Recovery (skip / insert / synchronize)
//!     ↓
//! GreenNode tree (immutable, cheap to clone)
//!     ↓
//! SyntaxNode (rowan) → CST with parent pointers
//! ```
//!
//! Alternatives of a choice are tried in declaration order and the first one
//! that matches wins. Trivia is attached in front of the token that follows it
//! and hoisted out of nodes, so a node starts at its first significant token.
//! The root owns leading and trailing trivia, and always spans the whole input.

mod config;
mod engine;
mod errors;
mod input;
mod parse;
mod recovery;

use std::sync::Arc;

use rayon::prelude::*;

use crate::base::TextSize;
use crate::compiler::CompiledAutomaton;
use crate::lexer::{Lexed, tokenize};

pub(crate) use engine::{Memo, MemoEntry};
pub(crate) use recovery::ReuseEntry;

pub use config::ParserConfig;
pub use errors::{ErrorCode, Recovery, RelatedInfo, Severity, SyntaxError, SyntaxErrorBuilder};
pub use parse::Parse;

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange};

/// Parses text with one compiled grammar. Cheap to clone and share between threads.
#[derive(Debug, Clone)]
pub struct Parser {
    automaton: Arc<CompiledAutomaton>,
    config: ParserConfig,
}

impl Parser {
    pub fn new(automaton: Arc<CompiledAutomaton>) -> Self {
        Self::with_config(automaton, ParserConfig::default())
    }

    pub fn with_config(automaton: Arc<CompiledAutomaton>, config: ParserConfig) -> Self {
        Self { automaton, config }
    }

    pub fn automaton(&self) -> &Arc<CompiledAutomaton> {
        &self.automaton
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Tokenize and parse. Never fails: errors are reported in the result.
    pub fn parse(&self, text: &str) -> Parse {
        let lexed = tokenize(text, &self.automaton);
        self.parse_lexed(text, lexed, Memo::default())
    }

    /// Parse already tokenized text. Tokens that do not cover `text` are
    /// discarded and the text is tokenized again.
    pub fn parse_tokens(&self, text: &str, lexed: &Lexed) -> Parse {
        if !covers(text, lexed) {
            tracing::debug!(
                tokens = lexed.len(),
                bytes = text.len(),
                "tokens do not cover the text; tokenizing again"
            );
            return self.parse(text);
        }
        self.parse_lexed(text, lexed.clone(), Memo::default())
    }

    /// Parse independent documents in parallel.
    pub fn parse_batch(&self, texts: &[&str]) -> Vec<Parse> {
        texts.par_iter().map(|text| self.parse(text)).collect()
    }

    pub(crate) fn parse_lexed(&self, text: &str, lexed: Lexed, seed: Memo) -> Parse {
        let reused = seed.len();
        let recovered = recovery::recover(&self.automaton, &self.config, text, &lexed, seed);
        let mut errors: Vec<SyntaxError> = lexed.errors().collect();
        errors.extend(recovered.errors);
        errors.sort_by_key(SyntaxError::offset);
        tracing::trace!(
            bytes = text.len(),
            errors = errors.len(),
            reused,
            "parsed"
        );
        Parse {
            green: recovered.green,
            errors,
            automaton: Arc::clone(&self.automaton),
            lexed: Arc::new(lexed),
            reuse: recovered.reuse.into(),
            reused,
        }
    }
}

/// Parse `text` with default options.
pub fn parse(automaton: &Arc<CompiledAutomaton>, text: &str) -> Parse {
    Parser::new(Arc::clone(automaton)).parse(text)
}

/// Tokens tile `text` exactly.
pub(crate) fn covers(text: &str, lexed: &Lexed) -> bool {
    let mut offset = TextSize::new(0);
    for token in lexed.tokens() {
        if token.range.start() != offset || !text.is_char_boundary(usize::from(token.range.end())) {
            return false;
        }
        offset = token.range.end();
    }
    offset == TextSize::of(text) && lexed.text_len() == offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::grammar::Grammar;

    fn parser(notation: &str) -> Parser {
        Parser::new(Arc::new(compile(&Grammar::from_notation(notation).unwrap()).unwrap()))
    }

    const AB: &str = r#"
        a : "a" b ;
        b : "b" | "bb" ;
    "#;

    #[test]
    fn test_parse_is_send() {
        fn assert_send<T: Send + Sync>() {}
        assert_send::<Parse>();
        assert_send::<Parser>();
    }

    #[test]
    fn test_longest_match_alternative() {
        let parse = parser(AB).parse("abb");
        assert!(parse.ok());
        assert_eq!(parse.to_sexp(), r#"(a "a" (b "bb"))"#);
    }

    #[test]
    fn test_error_node_and_missing_token() {
        let parse = parser(AB).parse("ac");
        assert_eq!(parse.to_sexp(), r#"(a "a" (ERROR "c") (b (MISSING "b")))"#);
        assert_eq!(parse.errors().len(), 1);
        let error = &parse.errors()[0];
        assert_eq!(error.offset(), TextSize::new(1));
        assert_eq!(error.expected, ["\"b\"", "\"bb\""]);
        assert_eq!(parse.text(), "ac");
    }

    #[test]
    fn test_parse_tokens_relexes_mismatch() {
        let parser = parser(AB);
        let lexed = tokenize("ab", parser.automaton());
        let parse = parser.parse_tokens("abb", &lexed);
        assert!(parse.ok());
        assert_eq!(parse.text(), "abb");
        assert!(!covers("abb", &lexed));
        assert!(covers("ab", &lexed));
    }

    #[test]
    fn test_strict_config_abandons() {
        let parser = Parser::with_config(parser(AB).automaton().clone(), ParserConfig::strict());
        let parse = parser.parse("ac");
        assert_eq!(parse.to_sexp(), r#"(a (ERROR "a" "c"))"#);
        assert_eq!(parse.errors()[0].recovery, Some(Recovery::Abandoned));
    }
}
