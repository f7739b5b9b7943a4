//! Text notation for grammars.
//!
//! A compact EBNF-like format, convenient for tests and small grammars.
//! See [`parse_notation`] for the accepted syntax.

mod lexer;
mod parser;

pub use parser::parse_notation;
