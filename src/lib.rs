//! # gramma
//!
//! Grammar-driven parser generator: declare a grammar as data, compile it once,
//! then parse any number of documents into lossless rowan trees with error
//! recovery and incremental reparsing.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! incremental → Edits, reparse with memo reuse
//!   ↓
//! tree        → Trivia, position lookup, error walk, S-expressions
//!   ↓
//! parser      → Ordered-choice engine, error recovery, Parse results
//!   ↓
//! lexer       → Longest-match tokenizer over the compiled lexical grammar
//!   ↓
//! compiler    → Kinds, lexical grammar, op program, analyses
//!   ↓
//! grammar     → Rule model, text notation, grammar.json loading
//!   ↓
//! base        → Primitives (TextRange, Position, LineIndex)
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use gramma::{Grammar, Parser, compile};
//!
//! let grammar = Grammar::from_notation(r#"
//!     a : "a" b ;
//!     b : "b" | "bb" ;
//! "#).unwrap();
//! let parser = Parser::new(Arc::new(compile(&grammar).unwrap()));
//! let parse = parser.parse("abb");
//! assert!(parse.ok());
//! assert_eq!(parse.to_sexp(), r#"(a "a" (b "bb"))"#);
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → compiler → lexer → parser → tree → incremental)
// ============================================================================

/// Foundation types: TextRange, Position, LineIndex
pub mod base;

/// Rule model: RuleExpr combinators, Grammar, loaders
pub mod grammar;

/// Grammar compiler: CompiledAutomaton, SyntaxKind, AutomatonCache
pub mod compiler;

/// Lexer: tokens, lexical errors
pub mod lexer;

/// Parsing engine: Parser, Parse, SyntaxError
pub mod parser;

/// Tree model: queries over parsed trees
pub mod tree;

/// Incremental reparsing: Edit, Parser::reparse
pub mod incremental;

// Re-export foundation types
pub use base::{LineIndex, Position, Span, TextRange, TextSize};

// Re-export the pipeline
pub use compiler::{
    AutomatonCache, CompileWarning, CompiledAutomaton, GrammarLanguage, SyntaxElement, SyntaxKind,
    SyntaxNode, SyntaxToken, compile,
};
pub use grammar::{Assoc, Grammar, GrammarError, RuleExpr};
pub use incremental::Edit;
pub use lexer::{LexError, Lexed, Lexer, Token, next_token, tokenize};
pub use parser::{ErrorCode, Parse, Parser, ParserConfig, Recovery, Severity, SyntaxError};
