//! Grammar compilation: kinds, token classification and rejected grammars.

use gramma::grammar::expr::{choice, literal, pattern, reference, seq};
use gramma::{CompileWarning, Grammar, GrammarError, SyntaxKind, compile};
use rstest::rstest;

use crate::helpers::grammar_fixtures::*;

fn grammar(rules: Vec<(&str, gramma::RuleExpr)>) -> Grammar {
    let mut grammar = Grammar::new("test");
    for (name, body) in rules {
        grammar.define(name, body).unwrap();
    }
    let first = grammar.rules().next().map(|(name, _)| name.clone());
    if let Some(first) = first {
        grammar.set_start(first);
    }
    grammar
}

#[test]
fn test_kind_names() {
    let automaton = &*DLIKE_AUTOMATON;
    assert_eq!(automaton.name(), "dlike");
    assert_eq!(automaton.kind_name(SyntaxKind::ERROR), "ERROR");
    assert_eq!(automaton.kind_name(SyntaxKind::MISSING), "MISSING");
    let auto = automaton.kind("auto").unwrap();
    assert_eq!(automaton.kind_name(auto), "\"auto\"");
    let declaration = automaton.kind("declaration").unwrap();
    assert_eq!(automaton.kind_name(declaration), "declaration");
    assert!(automaton.is_trivia(automaton.kind("comment").unwrap()));
    assert!(!automaton.is_trivia(automaton.kind("identifier").unwrap()));
}

#[test]
fn test_same_grammar_same_fingerprint() {
    let first = automaton(STATEMENTS);
    let second = automaton(STATEMENTS);
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_ne!(first.fingerprint(), automaton(AB).fingerprint());
}

#[test]
fn test_empty_grammar() {
    assert!(matches!(compile(&Grammar::new("empty")), Err(GrammarError::EmptyGrammar)));
}

#[test]
fn test_duplicate_definition() {
    let mut grammar = Grammar::new("dup");
    grammar.define("a", literal("x")).unwrap();
    let err = grammar.define("a", literal("y")).unwrap_err();
    assert!(matches!(err, GrammarError::DuplicateRule(ref name) if name == "a"));
}

#[test]
fn test_unresolved_reference() {
    let g = grammar(vec![("a", seq([literal("x"), reference("b")]))]);
    match compile(&g).unwrap_err() {
        GrammarError::UnresolvedRule { rule, reference } => {
            assert_eq!(rule, "a");
            assert_eq!(reference, "b");
        }
        other => panic!("expected unresolved rule, got {other:?}"),
    }
}

#[test]
fn test_invalid_pattern() {
    let g = grammar(vec![("a", seq([literal("x"), reference("b")])), ("b", pattern("("))]);
    assert!(matches!(compile(&g), Err(GrammarError::InvalidPattern { ref rule, .. }) if rule == "b"));
}

#[test]
fn test_syntactic_extra_is_rejected() {
    let mut g = grammar(vec![
        ("a", literal("x")),
        ("b", seq([literal("y"), literal("z")])),
    ]);
    g.mark_extra("b");
    assert!(matches!(compile(&g), Err(GrammarError::InvalidExtra { ref name, .. }) if name == "b"));
}

#[rstest]
#[case("indirect", "a : b \"x\" | \"y\" ; b : a \"z\" | \"w\" ;")]
#[case("no base", "a : a \"x\" ;")]
fn test_unsupported_left_recursion(#[case] name: &str, #[case] notation: &str) {
    let grammar = Grammar::from_notation(notation).unwrap();
    assert!(
        matches!(compile(&grammar), Err(GrammarError::LeftRecursion { .. })),
        "{name}"
    );
}

#[rstest]
#[case(r#"a : "x"? | "y" ;"#)]
#[case(r#"a : b | b ; b : "x" "y" ;"#)]
#[case(r#"a : ("x"?)* ;"#)]
fn test_conflicts(#[case] notation: &str) {
    let grammar = Grammar::from_notation(notation).unwrap();
    assert!(matches!(compile(&grammar), Err(GrammarError::GrammarConflict { .. })));
}

#[test]
fn test_overlapping_alternatives_compile_with_warning() {
    let g = grammar(vec![(
        "a",
        choice([
            seq([literal("x"), literal("y")]),
            seq([literal("x"), literal("z")]),
        ]),
    )]);
    let automaton = compile(&g).unwrap();
    assert!(
        automaton
            .warnings()
            .iter()
            .any(|warning| matches!(warning, CompileWarning::OrderedAmbiguity { .. }))
    );
}

#[cfg(feature = "json")]
#[test]
fn test_json_grammar_parses_like_notation() {
    let json = r#"{
        "name": "ab",
        "rules": {
            "a": { "type": "SEQ", "members": [
                { "type": "STRING", "value": "a" },
                { "type": "SYMBOL", "name": "b" }
            ] },
            "b": { "type": "CHOICE", "members": [
                { "type": "STRING", "value": "b" },
                { "type": "STRING", "value": "bb" }
            ] }
        }
    }"#;
    let grammar = Grammar::from_json(json).unwrap();
    let automaton = std::sync::Arc::new(compile(&grammar).unwrap());
    let parse = gramma::parser::parse(&automaton, "abb");
    assert_eq!(parse.to_sexp(), r#"(a "a" (b "bb"))"#);
}
