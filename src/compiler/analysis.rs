//! Nullable and FIRST sets for every op, by fixpoint iteration.

use super::program::{Op, OpId, Program, RuleBody, RuleId};
use super::token_set::TokenSet;

pub(crate) fn compute(program: &mut Program) {
    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut changed = false;
        for index in 0..program.op_count() {
            let id = OpId(index as u32);
            let nullable = nullable_of(program, id);
            if nullable && !program.nullable[index] {
                program.nullable[index] = true;
                changed = true;
            }
            let first = first_of(program, id);
            changed |= program.first[index].union_with(&first);
        }
        if !changed {
            break;
        }
    }
    tracing::trace!(rounds, ops = program.op_count(), "nullable/FIRST fixpoint reached");
}

fn nullable_of(program: &Program, id: OpId) -> bool {
    match program.op(id) {
        Op::Token(_) => false,
        Op::Blank | Op::Optional(_) => true,
        Op::Seq(items) => items.iter().all(|item| program.nullable(*item)),
        Op::Choice(items) => items.iter().any(|item| program.nullable(*item)),
        Op::Repeat { inner, min } => *min == 0 || program.nullable(*inner),
        Op::Call { rule, .. } => program.rule_nullable(*rule),
    }
}

fn first_of(program: &Program, id: OpId) -> TokenSet {
    match program.op(id) {
        Op::Token(kind) => TokenSet::single(*kind),
        Op::Blank => TokenSet::new(),
        Op::Seq(items) => {
            let mut first = TokenSet::new();
            for item in items {
                first.union_with(program.first(*item));
                if !program.nullable(*item) {
                    break;
                }
            }
            first
        }
        Op::Choice(items) => {
            let mut first = TokenSet::new();
            for item in items {
                first.union_with(program.first(*item));
            }
            first
        }
        Op::Repeat { inner, .. } | Op::Optional(inner) => program.first(*inner).clone(),
        Op::Call { rule, .. } => program.rule_first(*rule).clone(),
    }
}

/// Rules that may be invoked before any token is consumed, in first-seen order.
pub(crate) fn left_calls(program: &Program, id: OpId, out: &mut Vec<RuleId>) {
    match program.op(id) {
        Op::Token(_) | Op::Blank => {}
        Op::Call { rule, .. } => {
            if !out.contains(rule) {
                out.push(*rule);
            }
        }
        Op::Seq(items) => {
            for item in items {
                left_calls(program, *item, out);
                if !program.nullable(*item) {
                    break;
                }
            }
        }
        Op::Choice(items) => {
            for item in items {
                left_calls(program, *item, out);
            }
        }
        Op::Repeat { inner, .. } | Op::Optional(inner) => left_calls(program, *inner, out),
    }
}

/// Whether a tail could be applied without consuming input.
pub(crate) fn nullable_tails(program: &Program) -> Vec<(RuleId, usize)> {
    let mut found = Vec::new();
    for (id, rule) in program.rules() {
        if let RuleBody::LeftRecursive { tails, .. } = &rule.body {
            for (index, tail) in tails.iter().enumerate() {
                if program.nullable(tail.op) {
                    found.push((id, index));
                }
            }
        }
    }
    found
}
