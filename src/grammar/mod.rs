//! Rule Model: grammars as plain data.
//!
//! A [`Grammar`] maps rule names to [`RuleExpr`] combinator trees. Nothing is
//! parsed or validated here beyond duplicate detection; references are
//! resolved by the compiler.
//!
//! Grammars can be assembled in code, read from the text notation
//! ([`Grammar::from_notation`]) or from tree-sitter `grammar.json`
//! ([`Grammar::from_json`], feature `json`).

mod error;
pub mod expr;
#[cfg(feature = "json")]
mod json;
pub mod notation;
mod rules;

pub use error::GrammarError;
pub use expr::{Assoc, RuleExpr};
pub use rules::{DEFAULT_END_MARKERS, Grammar};

impl Grammar {
    /// Read a grammar written in the text notation.
    pub fn from_notation(input: &str) -> Result<Self, GrammarError> {
        notation::parse_notation(input)
    }

    /// Read a tree-sitter `grammar.json` document.
    #[cfg(feature = "json")]
    pub fn from_json(input: &str) -> Result<Self, GrammarError> {
        json::parse_json(input)
    }
}
