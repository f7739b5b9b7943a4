//! Error recovery: skipping, insertion, synchronization, budgets and giving up.

use std::sync::Arc;

use gramma::{ErrorCode, Parser, ParserConfig, Recovery, SyntaxKind, TextSize};

use crate::helpers::grammar_fixtures::*;
use crate::helpers::tree_assertions::*;

#[test]
fn test_extra_token_is_skipped() {
    let input = "a = = 1;";
    let parse = parser(&STATEMENTS_AUTOMATON).parse(input);
    assert_sexp(&parse, r#"(source (statement (identifier) "=" (ERROR "=") (number) ";"))"#);
    assert_lossless(&parse, input);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.code, ErrorCode::E0201);
    assert_eq!(error.offset(), TextSize::new(4));
    assert_eq!(error.recovery, Some(Recovery::Skipped));
}

#[test]
fn test_missing_token_is_inserted() {
    let input = "a = 1; b = ; c = 3;";
    let parse = parser(&STATEMENTS_AUTOMATON).parse(input);
    assert_sexp(
        &parse,
        concat!(
            r#"(source (statement (identifier) "=" (number) ";") "#,
            r#"(statement (identifier) "=" (MISSING number) ";") "#,
            r#"(statement (identifier) "=" (number) ";"))"#
        ),
    );
    assert_lossless(&parse, input);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.code, ErrorCode::E0202);
    assert_eq!(error.offset(), TextSize::new(11));
    assert_eq!(error.expected, ["number"]);
    assert_eq!(error.message, "expected number, found `;`");
    assert_eq!(error.recovery, Some(Recovery::Inserted("number".into())));
}

#[test]
fn test_unknown_characters_are_syntax_errors() {
    let input = "a = 1$;";
    let parse = parser(&STATEMENTS_AUTOMATON).parse(input);
    assert_lossless(&parse, input);
    assert_eq!(parse.lexed().errors().count(), 0);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.code, ErrorCode::E0101);
    assert_eq!(error.recovery, Some(Recovery::Skipped));
    assert_eq!(count_nodes(&parse, SyntaxKind::ERROR), 1);
}

#[test]
fn test_errors_in_several_statements() {
    let input = "a = ; b = 2; c 3; d = 4;";
    let parse = parser(&STATEMENTS_AUTOMATON).parse(input);
    assert_lossless(&parse, input);
    assert_eq!(parse.errors().len(), 2);
    assert!(parse.errors()[0].offset() < parse.errors()[1].offset());
    let statement = parse.automaton().kind("statement").unwrap();
    assert_eq!(count_nodes(&parse, statement), 4);
}

#[test]
fn test_garbage_between_statements_is_one_error_node() {
    let input = "a = 1; 2 3 4 5 6 7; b = 2;";
    let parse = parser(&STATEMENTS_AUTOMATON).parse(input);
    assert_lossless(&parse, input);
    assert!(!parse.ok());
    let statement = parse.automaton().kind("statement").unwrap();
    let statements = count_nodes(&parse, statement);
    assert!(statements >= 2, "{}", parse.to_sexp());
    for error in parse.errors() {
        assert!(error.recovery.is_some());
    }
}

#[test]
fn test_strict_config_abandons_to_error_root() {
    let parser = Parser::with_config(Arc::clone(&STATEMENTS_AUTOMATON), ParserConfig::strict());
    let input = "a = = 1;";
    let parse = parser.parse(input);
    assert_sexp(&parse, r#"(source (ERROR (identifier) "=" "=" (number) ";"))"#);
    assert_lossless(&parse, input);
    let [error] = parse.errors() else {
        panic!("expected one error, got {:?}", parse.errors());
    };
    assert_eq!(error.offset(), TextSize::new(4));
    assert_eq!(error.recovery, Some(Recovery::Abandoned));
}

#[test]
fn test_deep_nesting_is_skipped_locally() {
    let automaton = automaton(r#"s : "(" s ")" | "x" ;"#);
    let config = ParserConfig {
        max_depth: 16,
        ..ParserConfig::default()
    };
    let input = format!("{}x{}", "(".repeat(20), ")".repeat(20));
    let parse = Parser::with_config(automaton, config).parse(&input);
    assert_lossless(&parse, &input);
    let [overflow, extra] = parse.errors() else {
        panic!("expected two errors, got {:?}", parse.errors());
    };
    // Calls of `s` start at offsets 1..=16; skipping starts halfway down
    assert_eq!(overflow.code, ErrorCode::E0205);
    assert_eq!(overflow.offset(), TextSize::new(9));
    assert_eq!(overflow.recovery, Some(Recovery::Skipped));
    assert_eq!(extra.code, ErrorCode::E0201);
    assert_eq!(extra.offset(), TextSize::new(37));
    assert_eq!(extra.recovery, Some(Recovery::Synchronized { inserted: None }));

    let s = parse.automaton().kind("s").unwrap();
    assert_eq!(count_nodes(&parse, s), 17);
    assert_eq!(count_nodes(&parse, SyntaxKind::ERROR), 2);
}

#[test]
fn test_long_rule_chain_nests_within_default_depth() {
    let mut notation = String::from("source : e0 ;\n");
    for level in 0..15 {
        notation.push_str(&format!("e{} : e{} ;\n", level, level + 1));
    }
    notation.push_str("e15 : \"(\" e0 \")\" | number ;\nnumber : /[0-9]+/ ;\n");
    let automaton = automaton(&notation);
    let input = format!("{}1{}", "(".repeat(40), ")".repeat(40));
    let parse = Parser::new(automaton).parse(&input);
    assert!(parse.ok(), "{:?}", parse.errors());
    let e0 = parse.automaton().kind("e0").unwrap();
    assert_eq!(count_nodes(&parse, e0), 41);
}

#[test]
fn test_repair_budget_keeps_earlier_repairs() {
    let config = ParserConfig {
        max_repairs: 3,
        ..ParserConfig::default()
    };
    let parser = Parser::with_config(Arc::clone(&STATEMENTS_AUTOMATON), config);
    let input = "a = ;\n".repeat(10);
    let parse = parser.parse(&input);
    assert_lossless(&parse, &input);

    let recoveries: Vec<_> = parse.errors().iter().map(|error| error.recovery.clone()).collect();
    let inserted = Some(Recovery::Inserted("number".into()));
    assert_eq!(
        recoveries,
        [inserted.clone(), inserted.clone(), inserted, Some(Recovery::Truncated)]
    );
    assert_eq!(parse.errors()[3].offset(), TextSize::new(22));

    let statement = parse.automaton().kind("statement").unwrap();
    assert_eq!(count_nodes(&parse, statement), 4);
    assert_eq!(count_nodes(&parse, SyntaxKind::ERROR), 1);
    assert_eq!(count_nodes(&parse, SyntaxKind::MISSING), 5);
}

#[test]
fn test_many_errors_keep_their_statements() {
    let input = "a = ;\n".repeat(300);
    let parse = parser(&STATEMENTS_AUTOMATON).parse(&input);
    assert_lossless(&parse, &input);
    let max_repairs = ParserConfig::default().max_repairs;
    assert_eq!(parse.errors().len(), max_repairs + 1);
    assert_eq!(parse.errors()[max_repairs].recovery, Some(Recovery::Truncated));
    let statement = parse.automaton().kind("statement").unwrap();
    assert_eq!(count_nodes(&parse, statement), max_repairs + 1);
}

#[test]
fn test_display_includes_code_and_range() {
    let parse = parser(&STATEMENTS_AUTOMATON).parse("a = 1");
    let rendered = parse.errors()[0].to_string();
    assert!(rendered.starts_with("E0203: "), "{rendered}");
    assert!(rendered.ends_with("5..5"), "{rendered}");
}
