//! End-to-end parses of small grammars: shapes, errors and trivia placement.

use gramma::{ErrorCode, Recovery, SyntaxKind, TextSize};

use crate::helpers::grammar_fixtures::*;
use crate::helpers::tree_assertions::*;

#[test]
fn test_choice_picks_matching_alternative() {
    let parse = parser(&AB_AUTOMATON).parse("abb");
    assert!(parse.ok());
    assert_sexp(&parse, r#"(a "a" (b "bb"))"#);
    assert_lossless(&parse, "abb");
}

#[test]
fn test_unexpected_character_is_wrapped_and_reported() {
    let parse = parser(&AB_AUTOMATON).parse("ac");
    assert_sexp(&parse, r#"(a "a" (ERROR "c") (b (MISSING "b")))"#);
    assert_lossless(&parse, "ac");

    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.offset(), TextSize::new(1));
    assert_eq!(error.expected, ["\"b\"", "\"bb\""]);
    // `c` is not a token of the grammar at all
    assert_eq!(error.code, ErrorCode::E0101);
    assert_eq!(error.message, "expected \"b\" or \"bb\", found `c`");
    assert_eq!(
        error.recovery,
        Some(Recovery::Synchronized {
            inserted: Some("\"b\"".into())
        })
    );
}

#[test]
fn test_unterminated_comment_is_one_extra_and_one_error() {
    let automaton = automaton(
        r#"
        @extras comment
        source : "x"* ;
        comment : nested("/+", "+/") ;
    "#,
    );
    let parse = gramma::parser::parse(&automaton, "/+ abc");
    assert_lossless(&parse, "/+ abc");
    assert_sexp(&parse, "(source)");
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.offset(), TextSize::new(0));
    assert_eq!(error.code, ErrorCode::E0103);
    assert!(error.is_lexical());

    let comment = automaton.kind("comment").unwrap();
    let tokens: Vec<_> = parse
        .syntax()
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind(), comment);
    assert_eq!(tokens[0].text(), "/+ abc");
}

#[test]
fn test_empty_input() {
    let parse = parser(&STATEMENTS_AUTOMATON).parse("");
    assert!(parse.ok());
    assert_sexp(&parse, "(source)");
    assert_lossless(&parse, "");
}

#[test]
fn test_root_owns_surrounding_trivia() {
    let input = "  a = 1;\n";
    let parse = parser(&STATEMENTS_AUTOMATON).parse(input);
    assert!(parse.ok());
    assert_lossless(&parse, input);

    let root = parse.syntax();
    let statement = root.first_child().unwrap();
    assert_eq!(u32::from(statement.text_range().start()), 2);
    assert_eq!(u32::from(statement.text_range().end()), 8);
    let first = root.first_child_or_token().unwrap();
    assert_eq!(first.as_token().map(|token| token.text()), Some("  "));
    let last = root.last_child_or_token().unwrap();
    assert_eq!(last.as_token().map(|token| token.text()), Some("\n"));
}

#[test]
fn test_node_at_finds_innermost() {
    let parse = parser(&STATEMENTS_AUTOMATON).parse("a = 12; b = 3;");
    let found = parse.node_at(TextSize::new(5)).unwrap();
    assert_eq!(found.kind(), parse.automaton().kind("number").unwrap());
    assert_eq!(found.as_token().map(|token| token.text()), Some("12"));
    assert_eq!(found.parent().unwrap().kind(), parse.automaton().kind("statement").unwrap());
}

#[test]
fn test_missing_token_at_end_of_input() {
    let parse = parser(&STATEMENTS_AUTOMATON).parse("a = 1");
    assert_sexp(&parse, r#"(source (statement (identifier) "=" (number) (MISSING ";")))"#);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.code, ErrorCode::E0203);
    assert_eq!(error.offset(), TextSize::new(5));
    assert_eq!(error.message, "expected \";\", found end of input");
    assert_eq!(error.recovery, Some(Recovery::Inserted("\";\"".into())));
    assert_eq!(count_nodes(&parse, SyntaxKind::MISSING), 1);
}
