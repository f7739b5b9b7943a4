//! One compiled grammar shared by many parses at once.

use std::sync::Arc;
use std::thread;

use gramma::{AutomatonCache, Grammar};

use crate::helpers::grammar_fixtures::*;

#[test]
fn test_parse_batch_matches_sequential() {
    let parser = parser(&STATEMENTS_AUTOMATON);
    let texts: Vec<String> = (0..64)
        .map(|n| {
            if n % 3 == 0 {
                format!("x = {n}; y = ;")
            } else {
                format!("x = {n}; y = {};", n * 2)
            }
        })
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let batch = parser.parse_batch(&refs);
    assert_eq!(batch.len(), texts.len());
    for (parse, text) in batch.iter().zip(&texts) {
        let single = parser.parse(text);
        assert_eq!(parse.green(), single.green());
        assert_eq!(parse.errors(), single.errors());
    }
}

#[test]
fn test_threads_share_one_automaton() {
    let parser = Arc::new(parser(&DLIKE_AUTOMATON));
    thread::scope(|scope| {
        for n in 0..8 {
            let parser = Arc::clone(&parser);
            scope.spawn(move || {
                let text = format!("auto v{n} = [{n}, q\"({n})\"];");
                let parse = parser.parse(&text);
                assert!(parse.ok(), "{:?}", parse.errors());
                assert_eq!(parse.text(), text);
            });
        }
    });
}

#[test]
fn test_cache_compiles_once_across_threads() {
    let cache = AutomatonCache::new();
    let grammar = Grammar::from_notation(STATEMENTS).unwrap();
    let automatons: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| cache.get_or_compile(&grammar).unwrap()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    assert_eq!(cache.len(), 1);
    let cached = cache.get(&grammar).unwrap();
    for automaton in &automatons {
        assert!(Arc::ptr_eq(automaton, &cached));
    }
}
