//! Fixture grammars, compiled once per test binary.

use std::sync::Arc;

use gramma::{CompiledAutomaton, Grammar, Parser, compile};
use once_cell::sync::Lazy;

/// Two-rule grammar with a choice between `"b"` and `"bb"`.
pub const AB: &str = r#"
    a : "a" b ;
    b : "b" | "bb" ;
"#;

/// Assignments separated by `;`, which is also the synchronization token.
pub const STATEMENTS: &str = r#"
    @extras ws
    @sync ";"
    source : statement* ;
    statement : identifier "=" number ";" ;
    identifier : /[a-z]+/ ;
    number : /[0-9]+/ ;
    ws : /\s+/ ;
"#;

/// Binary operators at three precedence levels, `^` right associative.
pub const EXPR: &str = r#"
    @extras ws
    expr : prec_left(1, expr "+" expr)
         | prec_left(1, expr "-" expr)
         | prec_left(2, expr "*" expr)
         | prec_right(3, expr "^" expr)
         | "(" expr ")"
         | number ;
    number : /[0-9]+/ ;
    ws : /\s+/ ;
"#;

/// A small D-flavoured language: nesting comments, delimited strings, keywords.
pub const DLIKE: &str = r#"
    @name dlike
    @extras ws comment
    @word identifier
    @sync ";"
    module : declaration* ;
    declaration : "auto" identifier "=" _value ";" ;
    _value : string | number | array ;
    array : "[" (_value ("," _value)*)? "]" ;
    string : delimited("q\"", "\"") | quoted("\"", "\"") ;
    comment : nested("/+", "+/") | token("//" /[^\n]*/) ;
    identifier : /[A-Za-z_][A-Za-z0-9_]*/ ;
    number : /[0-9]+/ ;
    ws : /\s+/ ;
"#;

pub static AB_AUTOMATON: Lazy<Arc<CompiledAutomaton>> = Lazy::new(|| automaton(AB));
pub static STATEMENTS_AUTOMATON: Lazy<Arc<CompiledAutomaton>> = Lazy::new(|| automaton(STATEMENTS));
pub static EXPR_AUTOMATON: Lazy<Arc<CompiledAutomaton>> = Lazy::new(|| automaton(EXPR));
pub static DLIKE_AUTOMATON: Lazy<Arc<CompiledAutomaton>> = Lazy::new(|| automaton(DLIKE));

/// Compile grammar notation, panicking on any grammar error.
pub fn automaton(notation: &str) -> Arc<CompiledAutomaton> {
    let grammar = Grammar::from_notation(notation).unwrap_or_else(|err| panic!("bad notation: {err}"));
    Arc::new(compile(&grammar).unwrap_or_else(|err| panic!("bad grammar: {err}")))
}

pub fn parser(automaton: &Lazy<Arc<CompiledAutomaton>>) -> Parser {
    Parser::new(Arc::clone(automaton))
}
