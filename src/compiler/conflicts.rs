//! Conflict detection over the lowered program.
//!
//! Ordered choice makes every grammar deterministic, but some shapes make
//! declaration order meaningless: an empty-matching alternative shadows all
//! later ones, identical alternatives can never both be chosen, and a
//! repetition of something that matches nothing never terminates on its own.
//! Those are conflicts unless the rule sits in a declared conflict set.

use smol_str::SmolStr;

use super::CompileWarning;
use super::analysis::nullable_tails;
use super::kinds::KindTable;
use super::program::{Op, OpId, Program};
use crate::grammar::{Grammar, GrammarError};

pub(crate) fn check(
    grammar: &Grammar,
    program: &Program,
    kinds: &KindTable,
) -> Result<Vec<CompileWarning>, GrammarError> {
    let mut warnings = Vec::new();
    let mut report = |rules: Vec<SmolStr>, reason: String| -> Result<(), GrammarError> {
        if rules.iter().any(|rule| grammar.in_declared_conflict(rule)) {
            tracing::debug!(rules = ?rules, %reason, "declared conflict tolerated");
            warnings.push(CompileWarning::ToleratedConflict { rules, reason });
            Ok(())
        } else {
            Err(GrammarError::conflict(rules, reason))
        }
    };

    for index in 0..program.op_count() {
        let id = OpId(index as u32);
        let owner = &program.rule(program.owner(id)).name;
        match program.op(id) {
            Op::Choice(alternatives) => {
                let last = alternatives.len().saturating_sub(1);
                for (position, alternative) in alternatives.iter().enumerate() {
                    if position < last && program.nullable(*alternative) {
                        report(
                            competing(program, owner, &alternatives[position..]),
                            format!(
                                "alternative {} of `{}` matches the empty string, so the alternatives after it are never tried",
                                position + 1,
                                owner
                            ),
                        )?;
                    }
                }
                for (i, a) in alternatives.iter().enumerate() {
                    for (j, b) in alternatives.iter().enumerate().skip(i + 1) {
                        if program.same_shape(*a, *b) {
                            report(
                                competing(program, owner, &[*a, *b]),
                                format!("alternatives {} and {} of `{}` are identical", i + 1, j + 1, owner),
                            )?;
                        }
                    }
                }
            }
            Op::Repeat { inner, .. } if program.nullable(*inner) => {
                report(
                    competing(program, owner, &[*inner]),
                    format!("a repetition in `{}` can match the empty string", owner),
                )?;
            }
            _ => {}
        }
    }

    for (rule, tail) in nullable_tails(program) {
        let name = program.rule(rule).name.clone();
        let reason = format!(
            "left-recursive alternative {} of `{}` consumes nothing after `{}`",
            tail + 1,
            name,
            name
        );
        report(vec![name], reason)?;
    }

    warnings.extend(ordered_ambiguities(program, kinds));
    Ok(warnings)
}

/// The owning rule plus the rules the competing alternatives call directly.
fn competing(program: &Program, owner: &SmolStr, alternatives: &[OpId]) -> Vec<SmolStr> {
    let mut rules = vec![owner.clone()];
    for alternative in alternatives {
        if let Op::Call { rule, .. } = program.op(*alternative) {
            let name = &program.rule(*rule).name;
            if !rules.contains(name) {
                rules.push(name.clone());
            }
        }
    }
    rules
}

/// Alternatives with overlapping FIRST sets: resolved by order, reported for review.
fn ordered_ambiguities(program: &Program, kinds: &KindTable) -> Vec<CompileWarning> {
    let mut warnings = Vec::new();
    for index in 0..program.op_count() {
        let id = OpId(index as u32);
        let Op::Choice(alternatives) = program.op(id) else {
            continue;
        };
        for (i, a) in alternatives.iter().enumerate() {
            for (j, b) in alternatives.iter().enumerate().skip(i + 1) {
                let shared = program.first(*a).intersection(program.first(*b));
                if shared.is_empty() {
                    continue;
                }
                let rule = program.rule(program.owner(id)).name.clone();
                let tokens: Vec<SmolStr> = shared
                    .iter()
                    .filter_map(|kind| kinds.get(kind).map(|info| SmolStr::new(info.display())))
                    .collect();
                tracing::debug!(rule = %rule, first = i + 1, second = j + 1, tokens = ?tokens, "ordered ambiguity");
                warnings.push(CompileWarning::OrderedAmbiguity {
                    rule,
                    first: i + 1,
                    second: j + 1,
                    tokens,
                });
            }
        }
    }
    warnings
}
