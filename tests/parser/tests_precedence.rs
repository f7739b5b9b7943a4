//! Left-recursive rules with precedence and associativity.

use rstest::rstest;

use crate::helpers::grammar_fixtures::*;
use crate::helpers::tree_assertions::*;

#[rstest]
#[case("1", "(expr (number))")]
#[case("1 + 2", r#"(expr (expr (number)) "+" (expr (number)))"#)]
#[case(
    "1 + 2 + 3",
    r#"(expr (expr (expr (number)) "+" (expr (number))) "+" (expr (number)))"#
)]
#[case(
    "1 - 2 + 3",
    r#"(expr (expr (expr (number)) "-" (expr (number))) "+" (expr (number)))"#
)]
#[case(
    "1 + 2 * 3",
    r#"(expr (expr (number)) "+" (expr (expr (number)) "*" (expr (number))))"#
)]
#[case(
    "1 * 2 + 3",
    r#"(expr (expr (expr (number)) "*" (expr (number))) "+" (expr (number)))"#
)]
#[case(
    "2 ^ 3 ^ 4",
    r#"(expr (expr (number)) "^" (expr (expr (number)) "^" (expr (number))))"#
)]
#[case(
    "(1 + 2) * 3",
    r#"(expr (expr "(" (expr (expr (number)) "+" (expr (number))) ")") "*" (expr (number)))"#
)]
fn test_operator_trees(#[case] input: &str, #[case] expected: &str) {
    let parse = parser(&EXPR_AUTOMATON).parse(input);
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_sexp(&parse, expected);
    assert_lossless(&parse, input);
}

#[test]
fn test_dangling_operator_gets_missing_operand() {
    let parse = parser(&EXPR_AUTOMATON).parse("1 +");
    assert_lossless(&parse, "1 +");
    assert_eq!(parse.errors().len(), 1);
    assert!(parse.to_sexp().contains("MISSING"), "{}", parse.to_sexp());
}

#[test]
fn test_long_chain_stays_iterative() {
    let input = (0..2000).map(|n| n.to_string()).collect::<Vec<_>>().join(" + ");
    let parse = parser(&EXPR_AUTOMATON).parse(&input);
    assert!(parse.ok());
    assert_lossless(&parse, &input);
}
