//! Reparsing after edits gives the tree a full parse would give.

use gramma::{Edit, Parse, Parser, TextRange, TextSize, tokenize};
use rstest::rstest;

use crate::helpers::grammar_fixtures::*;
use crate::helpers::tree_assertions::*;

fn edit_and_compare(parser: &Parser, old_text: &str, range: TextRange, replacement: &str) -> (Parse, Parse) {
    let old = parser.parse(old_text);
    let edit = Edit::new(old_text, range, replacement);
    let new_text = edit.apply(old_text, replacement);
    let incremental = parser.reparse(&old, &edit, &new_text);
    let full = parser.parse(&new_text);
    assert_eq!(incremental.green(), full.green(), "{new_text:?}");
    assert_eq!(incremental.errors(), full.errors(), "{new_text:?}");
    assert_lossless(&incremental, &new_text);
    (incremental, full)
}

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

#[test]
fn test_insertion_into_valid_input() {
    let parser = parser(&AB_AUTOMATON);
    let (incremental, _) = edit_and_compare(&parser, "abb", range(1, 1), "x");
    assert_eq!(incremental.text(), "axbb");
    assert!(!incremental.ok());
}

#[rstest]
#[case::change_value("a = 1; b = 2; c = 3; d = 4;", range(11, 12), "42")]
#[case::change_name("a = 1; b = 2; c = 3; d = 4;", range(7, 8), "bee")]
#[case::delete_statement("a = 1; b = 2; c = 3; d = 4;", range(7, 14), "")]
#[case::insert_statement("a = 1; b = 2; c = 3;", range(7, 7), "x = 9; ")]
#[case::break_statement("a = 1; b = 2; c = 3;", range(9, 10), "")]
#[case::fix_statement("a = 1; b 2; c = 3;", range(8, 8), " =")]
#[case::append("a = 1;", range(6, 6), " b = 2;")]
#[case::prepend("a = 1;", range(0, 0), "z = 0; ")]
#[case::whitespace_only("a = 1; b = 2;", range(6, 7), "\n\n   ")]
#[case::replace_all("a = 1;", range(0, 6), "q = 7;")]
fn test_statement_edits(#[case] old: &str, #[case] range: TextRange, #[case] replacement: &str) {
    edit_and_compare(&parser(&STATEMENTS_AUTOMATON), old, range, replacement);
}

#[rstest]
#[case::close_comment("auto x = 1; /+ open auto y = 2;", range(19, 19), " +/")]
#[case::open_comment("auto x = 1; auto y = 2; auto z = 3;", range(12, 12), "/+ ")]
#[case::edit_inside_string("auto s = q\"(abc)\"; auto t = 1;", range(12, 13), "((x))")]
#[case::nest_array("auto a = [1, 2];", range(13, 14), "[2, [3]]")]
fn test_dlike_edits(#[case] old: &str, #[case] range: TextRange, #[case] replacement: &str) {
    edit_and_compare(&parser(&DLIKE_AUTOMATON), old, range, replacement);
}

#[test]
fn test_untouched_statements_are_reused() {
    let parser = parser(&STATEMENTS_AUTOMATON);
    let text: String = (0..50).map(|n| format!("v = {n};\n")).collect();
    let offset = text.find("25").unwrap() as u32;
    let (incremental, full) = edit_and_compare(&parser, &text, range(offset, offset + 2), "2500");
    assert_eq!(full.reused(), 0);
    assert!(incremental.reused() > 40, "reused {}", incremental.reused());
}

#[test]
fn test_reused_subtrees_are_shared() {
    let parser = parser(&STATEMENTS_AUTOMATON);
    let text = "a = 1; b = 2; c = 3;";
    let old = parser.parse(text);
    let edit = Edit::new(text, range(11, 12), "9");
    let new_text = edit.apply(text, "9");
    let new = parser.reparse(&old, &edit, &new_text);
    let first = |parse: &Parse| match parse.green().children().next() {
        Some(rowan::NodeOrToken::Node(node)) => node as *const rowan::GreenNodeData,
        other => panic!("expected a statement node, got {other:?}"),
    };
    assert!(std::ptr::eq(first(&old), first(&new)));
}

#[test]
fn test_chained_edits() {
    let parser = parser(&STATEMENTS_AUTOMATON);
    let mut text = String::from("a = 1; b = 2; c = 3;");
    let mut parse = parser.parse(&text);
    let edits = [(range(4, 5), "10"), (range(0, 0), "z = 0; "), (range(14, 15), ""), (range(14, 14), "=")];
    for (range, replacement) in edits {
        let edit = Edit::new(&text, range, replacement);
        text = edit.apply(&text, replacement);
        parse = parser.reparse(&parse, &edit, &text);
        let full = parser.parse(&text);
        assert_eq!(parse.green(), full.green(), "{text:?}");
        assert_eq!(parse.errors(), full.errors(), "{text:?}");
    }
}

#[test]
fn test_reparse_tokens_uses_given_tokens() {
    let parser = parser(&STATEMENTS_AUTOMATON);
    let old_text = "a = 1; b = 2;";
    let old = parser.parse(old_text);
    let edit = Edit::insert(old_text, TextSize::new(13), " c = 3;");
    let new_text = edit.apply(old_text, " c = 3;");
    let lexed = tokenize(&new_text, parser.automaton());
    let parse = parser.reparse_tokens(&old, &edit, &new_text, &lexed);
    assert!(parse.ok());
    assert!(parse.reused() > 0);
    assert_eq!(parse.lexed(), &lexed);

    // Tokens for some other text are replaced
    let stale = tokenize(old_text, parser.automaton());
    let parse = parser.reparse_tokens(&old, &edit, &new_text, &stale);
    assert_eq!(parse.text(), new_text);
    assert_eq!(parse.green(), parser.parse(&new_text).green());
}

#[test]
fn test_inconsistent_edit_parses_from_scratch() {
    let parser = parser(&STATEMENTS_AUTOMATON);
    let old = parser.parse("a = 1;");
    let edit = Edit::insert("a = 1;", TextSize::new(6), " b = 2;");
    let parse = parser.reparse(&old, &edit, "a = 1; b = 22;");
    assert_eq!(parse.reused(), 0);
    assert_eq!(parse.green(), parser.parse("a = 1; b = 22;").green());
}

#[test]
fn test_other_grammar_parses_from_scratch() {
    let old = parser(&AB_AUTOMATON).parse("abb");
    let parser = parser(&STATEMENTS_AUTOMATON);
    let edit = Edit::new("abb", range(0, 3), "a = 1;");
    let parse = parser.reparse(&old, &edit, "a = 1;");
    assert_eq!(parse.reused(), 0);
    assert!(parse.ok());
}
