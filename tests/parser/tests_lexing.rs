//! Context-sensitive tokens through the whole pipeline: nesting comments,
//! delimited strings, keywords and hidden rules.

use gramma::{ErrorCode, SyntaxKind, TextSize, tokenize};
use rstest::rstest;

use crate::helpers::grammar_fixtures::*;
use crate::helpers::tree_assertions::*;

#[rstest]
#[case("auto x = 1;", r#"(module (declaration "auto" (identifier) "=" (number) ";"))"#)]
#[case(
    r#"auto s = q"(a(b)c)";"#,
    r#"(module (declaration "auto" (identifier) "=" (string) ";"))"#
)]
#[case(
    "auto s = q\"EOS\nline \" )\nEOS\";",
    r#"(module (declaration "auto" (identifier) "=" (string) ";"))"#
)]
#[case(
    r#"auto s = "say \"hi\"";"#,
    r#"(module (declaration "auto" (identifier) "=" (string) ";"))"#
)]
#[case(
    "auto a = [1, [2], q\"/x/\"];",
    r#"(module (declaration "auto" (identifier) "=" (array "[" (number) "," (array "[" (number) "]") "," (string) "]") ";"))"#
)]
#[case(
    "/+ outer /+ inner +/ still outer +/ auto x = 1; // done",
    r#"(module (declaration "auto" (identifier) "=" (number) ";"))"#
)]
fn test_valid_modules(#[case] input: &str, #[case] expected: &str) {
    let parse = parser(&DLIKE_AUTOMATON).parse(input);
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_sexp(&parse, expected);
    assert_lossless(&parse, input);
}

#[test]
fn test_keyword_is_not_an_identifier() {
    let automaton = &*DLIKE_AUTOMATON;
    let lexed = tokenize("auto autos", automaton);
    let kinds: Vec<_> = lexed.significant().map(|token| automaton.kind_name(token.kind)).collect();
    assert_eq!(kinds, ["\"auto\"", "identifier"]);

    let parse = parser(&DLIKE_AUTOMATON).parse("auto auto = 1;");
    assert!(!parse.ok());
    assert_lossless(&parse, "auto auto = 1;");
}

#[test]
fn test_unterminated_comment_after_code() {
    let input = "auto x = 1; /+ never /+ closed +/";
    let parse = parser(&DLIKE_AUTOMATON).parse(input);
    assert_lossless(&parse, input);
    assert_sexp(&parse, r#"(module (declaration "auto" (identifier) "=" (number) ";"))"#);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.code, ErrorCode::E0103);
    assert_eq!(error.offset(), TextSize::new(12));
}

#[test]
fn test_unterminated_string_is_lexical_error() {
    let input = "auto s = q\"(abc";
    let parse = parser(&DLIKE_AUTOMATON).parse(input);
    assert_lossless(&parse, input);
    let lexical: Vec<_> = parse.errors().iter().filter(|error| error.is_lexical()).collect();
    assert_eq!(lexical.len(), 1);
    assert_eq!(lexical[0].code, ErrorCode::E0102);
    assert_eq!(lexical[0].offset(), TextSize::new(9));
    // The string token itself parses; only the `;` is missing
    assert_eq!(parse.errors().len(), 2);
    assert_eq!(parse.errors()[1].code, ErrorCode::E0203);
}

#[test]
fn test_missing_value_is_inserted_before_sync_token() {
    let input = "auto x = ; auto y = 2;";
    let parse = parser(&DLIKE_AUTOMATON).parse(input);
    assert_lossless(&parse, input);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.code, ErrorCode::E0202);
    assert_eq!(error.offset(), TextSize::new(9));
    let declaration = parse.automaton().kind("declaration").unwrap();
    assert_eq!(count_nodes(&parse, declaration), 2);
    assert_eq!(count_nodes(&parse, SyntaxKind::MISSING), 1);
}

#[test]
fn test_end_marker_ends_the_module() {
    let input = "auto x = 1;\u{1A} anything @@ goes";
    let parse = parser(&DLIKE_AUTOMATON).parse(input);
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_lossless(&parse, input);
    let last = parse.syntax().last_token().unwrap();
    assert_eq!(last.kind(), SyntaxKind::END_MARKER);
}

const ALTERNATIVES: &str = r#"
    @extras ws
    source : (op | number)* ;
    op : token("=" | "==") ;
    number : /[0-9]+|[0-9]+\.[0-9]+/ ;
    ws : /\s+/ ;
"#;

#[rstest]
#[case("==", r#"(source (op))"#)]
#[case("= ==", r#"(source (op) (op))"#)]
#[case("1.5", r#"(source (number))"#)]
#[case("1.5 == 2", r#"(source (number) (op) (number))"#)]
fn test_token_alternatives_take_longest_match(#[case] input: &str, #[case] expected: &str) {
    let automaton = automaton(ALTERNATIVES);
    let lexed = tokenize(input, &automaton);
    let texts: Vec<_> = lexed.significant().map(|token| token.text(input)).collect();
    assert_eq!(texts, input.split(' ').collect::<Vec<_>>());

    let parse = gramma::Parser::new(automaton).parse(input);
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_sexp(&parse, expected);
}
