//! Properties over generated inputs and edits.

use gramma::{Edit, TextRange, TextSize};
use proptest::prelude::*;

use crate::helpers::grammar_fixtures::*;

/// Input over the statement grammar's alphabet, valid or not.
fn statement_text() -> impl Strategy<Value = String> {
    "[ab1=; \n]{0,32}"
}

/// Arithmetic over the expression grammar's alphabet, often unbalanced.
fn expr_text() -> impl Strategy<Value = String> {
    "[0-9+\\-*^() ]{0,24}"
}

/// Input with comment, string and bracket fragments of the D-like grammar.
fn dlike_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("auto"),
            Just(" "),
            Just("x"),
            Just("="),
            Just("1"),
            Just(";"),
            Just("["),
            Just("]"),
            Just(","),
            Just("/+"),
            Just("+/"),
            Just("//"),
            Just("\n"),
            Just("q\"("),
            Just(")\""),
            Just("\""),
            Just("$"),
        ],
        0..24,
    )
    .prop_map(|pieces| pieces.concat())
}

/// An edit of `text`: a range clamped to the text and a replacement.
fn edit_of(text: &str, start: usize, len: usize, replacement: &str) -> (Edit, String) {
    let start = start.min(text.len());
    let end = (start + len).min(text.len());
    let range = TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32));
    let edit = Edit::new(text, range, replacement);
    let new_text = edit.apply(text, replacement);
    (edit, new_text)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_tree_covers_input(text in dlike_text()) {
        let parse = parser(&DLIKE_AUTOMATON).parse(&text);
        prop_assert_eq!(parse.text(), text.clone());
        prop_assert_eq!(u32::from(parse.syntax().text_range().len()) as usize, text.len());
    }

    #[test]
    fn prop_parse_is_deterministic(text in dlike_text()) {
        let parser = parser(&DLIKE_AUTOMATON);
        let first = parser.parse(&text);
        let second = parser.parse(&text);
        prop_assert_eq!(first.green(), second.green());
        prop_assert_eq!(first.errors(), second.errors());
    }

    #[test]
    fn prop_statement_reparse_matches_full_parse(
        text in statement_text(),
        start in 0usize..40,
        len in 0usize..6,
        replacement in statement_text().prop_map(|text| text.chars().take(6).collect::<String>()),
    ) {
        let parser = parser(&STATEMENTS_AUTOMATON);
        let old = parser.parse(&text);
        let (edit, new_text) = edit_of(&text, start, len, &replacement);
        let incremental = parser.reparse(&old, &edit, &new_text);
        let full = parser.parse(&new_text);
        prop_assert_eq!(incremental.green(), full.green());
        prop_assert_eq!(incremental.errors(), full.errors());
    }

    #[test]
    fn prop_dlike_reparse_matches_full_parse(
        text in dlike_text(),
        start in 0usize..64,
        len in 0usize..8,
        replacement in dlike_text().prop_map(|text| text.chars().take(8).collect::<String>()),
    ) {
        let parser = parser(&DLIKE_AUTOMATON);
        let old = parser.parse(&text);
        let (edit, new_text) = edit_of(&text, start, len, &replacement);
        let incremental = parser.reparse(&old, &edit, &new_text);
        let full = parser.parse(&new_text);
        prop_assert_eq!(incremental.green(), full.green());
        prop_assert_eq!(incremental.errors(), full.errors());
    }

    #[test]
    fn prop_expr_reparse_matches_full_parse(
        text in expr_text(),
        start in 0usize..32,
        len in 0usize..6,
        replacement in expr_text().prop_map(|text| text.chars().take(6).collect::<String>()),
    ) {
        let parser = parser(&EXPR_AUTOMATON);
        let old = parser.parse(&text);
        let (edit, new_text) = edit_of(&text, start, len, &replacement);
        let incremental = parser.reparse(&old, &edit, &new_text);
        let full = parser.parse(&new_text);
        prop_assert_eq!(incremental.green(), full.green());
        prop_assert_eq!(incremental.errors(), full.errors());
    }
}
