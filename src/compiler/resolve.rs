//! Name resolution and reachability.

use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::grammar::{Grammar, GrammarError};

pub(crate) struct Resolution {
    pub start: SmolStr,
    /// Rules reachable from neither the start rule, the extras, nor the word.
    pub unreachable: Vec<SmolStr>,
}

pub(crate) fn resolve(grammar: &Grammar) -> Result<Resolution, GrammarError> {
    let start = match grammar.start() {
        Some(start) if grammar.rule_count() > 0 => start.clone(),
        _ => return Err(GrammarError::EmptyGrammar),
    };
    if grammar.rule(&start).is_none() {
        return Err(GrammarError::unresolved("start", start));
    }

    for (name, body) in grammar.rules() {
        let mut missing = None;
        body.for_each_reference(&mut |reference| {
            if missing.is_none() && grammar.rule(reference).is_none() {
                missing = Some(reference.clone());
            }
        });
        if let Some(reference) = missing {
            return Err(GrammarError::unresolved(name.clone(), reference));
        }
    }

    let directives = [
        ("extras", grammar.extras().collect::<Vec<_>>()),
        ("hidden", grammar.explicitly_hidden().collect()),
        ("word", grammar.word().into_iter().collect()),
        ("conflicts", grammar.conflicts().iter().flatten().collect()),
    ];
    for (directive, names) in directives {
        if let Some(name) = names.into_iter().find(|name| grammar.rule(name).is_none()) {
            return Err(GrammarError::unresolved(directive, name.clone()));
        }
    }

    let unreachable = unreachable_rules(grammar, &start);
    for rule in &unreachable {
        tracing::warn!(rule = %rule, grammar = grammar.name(), "rule is unreachable");
    }
    Ok(Resolution { start, unreachable })
}

fn unreachable_rules(grammar: &Grammar, start: &SmolStr) -> Vec<SmolStr> {
    let mut reached: IndexSet<SmolStr> = IndexSet::new();
    reached.insert(start.clone());
    reached.extend(grammar.extras().cloned());
    reached.extend(grammar.word().cloned());
    let mut next = 0;
    while let Some(name) = reached.get_index(next).cloned() {
        next += 1;
        if let Some(body) = grammar.rule(&name) {
            body.for_each_reference(&mut |reference| {
                reached.insert(reference.clone());
            });
        }
    }
    grammar
        .rules()
        .map(|(name, _)| name)
        .filter(|name| !reached.contains(*name))
        .cloned()
        .collect()
}
