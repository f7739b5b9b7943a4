//! Left-corner cycle detection.
//!
//! Direct left recursion has already been rewritten into base + tails by the
//! lowering, so any cycle that remains in the left-corner graph (indirect
//! recursion, or recursion behind a nullable prefix) cannot be evaluated.

use smol_str::SmolStr;

use super::analysis::left_calls;
use super::program::{Program, RuleId};
use crate::grammar::GrammarError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

pub(crate) fn check(program: &Program) -> Result<(), GrammarError> {
    let edges: Vec<Vec<RuleId>> = program
        .rules()
        .map(|(_, rule)| {
            let mut calls = Vec::new();
            left_calls(program, rule.entry(), &mut calls);
            calls
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut stack = Vec::new();
    for (root, _) in program.rules() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }
        if let Some(cycle) = visit(root, &edges, &mut marks, &mut stack) {
            let cycle: Vec<SmolStr> = cycle
                .into_iter()
                .map(|id| program.rule(id).name.clone())
                .collect();
            tracing::debug!(cycle = ?cycle, "left-recursive cycle");
            return Err(GrammarError::LeftRecursion { cycle });
        }
    }
    Ok(())
}

/// Depth-first search with an explicit path; returns the first cycle found.
fn visit(
    rule: RuleId,
    edges: &[Vec<RuleId>],
    marks: &mut [Mark],
    stack: &mut Vec<RuleId>,
) -> Option<Vec<RuleId>> {
    marks[rule.index()] = Mark::OnStack;
    stack.push(rule);
    for &next in &edges[rule.index()] {
        match marks[next.index()] {
            Mark::OnStack => {
                let from = stack.iter().position(|id| *id == next).unwrap_or(0);
                let mut cycle = stack[from..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(next, edges, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }
    stack.pop();
    marks[rule.index()] = Mark::Done;
    None
}
