//! Error recovery around the engine.
//!
//! A failed run reports its farthest failure. Recovery then looks for one
//! repair at that site, trying in order:
//!
//! 1. skip the offending token
//! 2. insert a missing token, one expected kind at a time
//! 3. skip to a synchronization point, alone or followed by an insertion
//! 4. skip the rest of the input
//!
//! A repair is accepted only if the parse then succeeds or fails strictly
//! later in the input. Insertions at end of input, which cannot move the
//! failure any further, are capped per position instead. Together with the
//! trial and repair budgets this bounds the work per error site.
//!
//! Input nested deeper than the call depth limit is skipped from halfway
//! down the offending call stack, so the error stays local.
//!
//! When a budget runs out, or no repair works, the repairs made so far are
//! kept and the rest of the input is skipped. Only when even that does not
//! give a tree, or recovery is disabled, is the whole input wrapped in one
//! `ERROR` node.

use rowan::{GreenNode, NodeOrToken};
use smol_str::SmolStr;

use super::ParserConfig;
use super::engine::{Engine, Failure, Frag, Memo, MemoEntry, MemoKey, Outcome, Overflow};
use super::errors::{ErrorCode, Recovery, SyntaxError};
use super::input::{Repair, Source, VTok, first_difference, stream};
use crate::base::{TextRange, TextSize};
use crate::compiler::{CompiledAutomaton, SyntaxKind};
use crate::lexer::Lexed;

/// A memo entry of a finished parse, indexed by significant token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReuseEntry {
    pub(crate) key: MemoKey,
    pub(crate) entry: MemoEntry,
}

/// Tree, syntax errors and reusable memo entries of one parse.
pub(crate) struct Recovered {
    pub(crate) green: GreenNode,
    pub(crate) errors: Vec<SyntaxError>,
    pub(crate) reuse: Vec<ReuseEntry>,
}

struct Accepted {
    repairs: Vec<Repair>,
    outcome: Outcome,
    recovery: Recovery,
}

struct Session<'a> {
    automaton: &'a CompiledAutomaton,
    config: &'a ParserConfig,
    text: &'a str,
    source: Source<'a>,
    tokens: Vec<VTok>,
    memo: Memo,
    trials: usize,
}

/// Parse `lexed`, repairing syntax errors. `seed` holds memo entries valid
/// for the unrepaired token stream.
pub(crate) fn recover(
    automaton: &CompiledAutomaton,
    config: &ParserConfig,
    text: &str,
    lexed: &Lexed,
    seed: Memo,
) -> Recovered {
    let source = Source::new(text, lexed);
    let tokens = stream(&source, &[]);
    let mut session = Session {
        automaton,
        config,
        text,
        source,
        tokens,
        memo: seed,
        trials: 0,
    };

    let mut repairs = Vec::new();
    let mut errors = Vec::new();
    let Some(mut outcome) = session.trial(&repairs) else {
        return session.abandon(errors, None);
    };
    loop {
        if let Some(frag) = outcome.frag.take() {
            let green = session.finish(frag);
            let reuse = session.reuse_table();
            return Recovered { green, errors, reuse };
        }
        let site = match outcome.overflow {
            Some(overflow) => session.real(overflow.from),
            None => session.real(outcome.failure.pos),
        };
        if config.max_repairs == 0 {
            return session.abandon(errors, Some((site, outcome)));
        }
        if errors.len() >= config.max_repairs {
            tracing::debug!(site, repairs = errors.len(), "repair budget exhausted");
            return session.truncate(repairs, errors, site, outcome);
        }
        let accepted = match outcome.overflow {
            Some(overflow) => session.unnest(&repairs, overflow, site),
            None => session.repair(&repairs, &outcome.failure, site),
        };
        match accepted {
            Some(accepted) => {
                tracing::trace!(site, recovery = %accepted.recovery, "repaired");
                errors.push(session.error(site, &outcome, Some(accepted.recovery)));
                repairs = accepted.repairs;
                outcome = accepted.outcome;
            }
            None => {
                tracing::debug!(site, trials = session.trials, "no repair found");
                return session.truncate(repairs, errors, site, outcome);
            }
        }
    }
}

impl Session<'_> {
    /// Run the engine over `repairs` within the trial budget.
    fn trial(&mut self, repairs: &[Repair]) -> Option<Outcome> {
        if self.trials >= self.config.max_trials {
            return None;
        }
        self.trials += 1;
        Some(self.run(repairs))
    }

    /// Run the engine over `repairs`, keeping memo entries the change cannot affect.
    fn run(&mut self, repairs: &[Repair]) -> Outcome {
        let tokens = stream(&self.source, repairs);
        let unchanged = first_difference(&self.tokens, &tokens);
        self.memo.retain(|_, entry| entry.lookahead <= unchanged);
        self.tokens = tokens;
        Engine::new(self.automaton, self.config, &self.tokens, &mut self.memo).run()
    }

    /// Root node: the start rule's elements between the file's leading and trailing trivia.
    fn finish(&self, frag: Frag) -> GreenNode {
        let mut children = frag.leading;
        children.extend(frag.elems);
        if let Some(eof) = self.tokens.last() {
            children.extend(eof.leading.iter().cloned());
        }
        GreenNode::new(self.automaton.start_kind().into(), children)
    }

    /// Significant token index of a stream position.
    fn real(&self, pos: usize) -> usize {
        self.tokens.get(pos).map_or(self.source.len(), |tok| tok.at)
    }

    fn range(&self, index: usize) -> TextRange {
        match self.source.token_index(index) {
            Some(token) => self.source.lexed().tokens()[token].range,
            None => TextRange::empty(TextSize::of(self.text)),
        }
    }

    fn repair(&mut self, repairs: &[Repair], failure: &Failure, site: usize) -> Option<Accepted> {
        let n = self.source.len();
        let expected: Vec<SyntaxKind> = failure
            .expected
            .iter()
            .filter(|kind| !kind.is_reserved())
            .collect();

        if site < n {
            let candidate = with(repairs, [Repair::Skip { from: site, to: site + 1 }]);
            let outcome = self.trial(&candidate)?;
            if self.progressed(&outcome, site + 1) {
                return Some(self.accepted(candidate, outcome, Recovery::Skipped));
            }
        }

        if self.can_insert(repairs, site) {
            let mut fallback = None;
            for &kind in &expected {
                let candidate = with(repairs, [Repair::Insert { at: site, kind }]);
                let outcome = self.trial(&candidate)?;
                let accept = if site < n {
                    self.progressed(&outcome, site)
                } else {
                    outcome.success()
                };
                if accept {
                    return Some(self.accepted(candidate, outcome, Recovery::Inserted(self.name(kind))));
                }
                if site == n && fallback.is_none() && outcome.failure.pos > failure.pos {
                    fallback = Some((candidate, kind));
                }
            }
            if let Some((candidate, kind)) = fallback {
                // Later trials moved the stream on; run the chosen one again
                let outcome = self.trial(&candidate)?;
                return Some(self.accepted(candidate, outcome, Recovery::Inserted(self.name(kind))));
            }
        }

        if site >= n {
            return None;
        }
        for point in self.sync_points(site) {
            if point > site + 1 {
                let candidate = with(repairs, [Repair::Skip { from: site, to: point }]);
                let outcome = self.trial(&candidate)?;
                if self.progressed(&outcome, point) {
                    return Some(self.accepted(candidate, outcome, Recovery::Synchronized { inserted: None }));
                }
            }
            for &kind in &expected {
                let candidate = with(
                    repairs,
                    [
                        Repair::Skip { from: site, to: point },
                        Repair::Insert { at: point, kind },
                    ],
                );
                let outcome = self.trial(&candidate)?;
                if self.progressed(&outcome, point) {
                    let inserted = Some(self.name(kind));
                    return Some(self.accepted(candidate, outcome, Recovery::Synchronized { inserted }));
                }
            }
        }

        let candidate = with(repairs, [Repair::Skip { from: site, to: n }]);
        let outcome = self.trial(&candidate)?;
        if self.progressed(&outcome, site) {
            return Some(self.accepted(candidate, outcome, Recovery::Synchronized { inserted: None }));
        }
        None
    }

    /// Skip input nested too deeply, from `site` (the overflow's `from`) on.
    ///
    /// Takes the first end that lets the parse succeed, else the one that
    /// gets it farthest.
    fn unnest(&mut self, repairs: &[Repair], overflow: Overflow, site: usize) -> Option<Accepted> {
        let n = self.source.len();
        let past = self.real(overflow.at).max(site);
        let mut best: Option<(usize, usize)> = None;
        for point in site + 1..=n {
            let candidate = with(repairs, [Repair::Skip { from: site, to: point }]);
            let Some(outcome) = self.trial(&candidate) else {
                break;
            };
            if outcome.success() {
                return Some(self.accepted(candidate, outcome, Recovery::Skipped));
            }
            if self.progressed(&outcome, point.max(past)) {
                let reached = self.real(outcome.failure.pos);
                if best.is_none_or(|(_, farthest)| reached > farthest) {
                    best = Some((point, reached));
                }
            }
        }
        let (point, _) = best?;
        let candidate = with(repairs, [Repair::Skip { from: site, to: point }]);
        let outcome = self.run(&candidate);
        Some(self.accepted(candidate, outcome, Recovery::Skipped))
    }

    /// Keep the repairs so far and skip everything from `site` on, then
    /// complete the tree with insertions at end of input. Abandons if that
    /// does not give a tree either.
    fn truncate(
        mut self,
        repairs: Vec<Repair>,
        mut errors: Vec<SyntaxError>,
        site: usize,
        outcome: Outcome,
    ) -> Recovered {
        let n = self.source.len();
        let mut candidate = if site < n {
            with(&repairs, [Repair::Skip { from: site, to: n }])
        } else {
            repairs
        };
        let mut current = self.run(&candidate);
        for _ in 0..self.config.max_insertions_per_position {
            if current.success() || current.overflow.is_some() || self.real(current.failure.pos) < n {
                break;
            }
            let expected: Vec<SyntaxKind> = current
                .failure
                .expected
                .iter()
                .filter(|kind| !kind.is_reserved())
                .collect();
            let mut next = None;
            for kind in expected {
                let attempt = with(&candidate, [Repair::Insert { at: n, kind }]);
                let result = self.run(&attempt);
                if result.success() {
                    next = Some((attempt, result));
                    break;
                }
                if next.is_none() && result.failure.pos > current.failure.pos {
                    next = Some((attempt, result));
                }
            }
            let Some((attempt, _)) = next else {
                break;
            };
            // Later attempts moved the stream on; run the chosen one again
            current = self.run(&attempt);
            candidate = attempt;
        }

        let Some(frag) = current.frag.take() else {
            return self.abandon(errors, Some((site, outcome)));
        };
        tracing::debug!(site, errors = errors.len() + 1, "rest of the input skipped");
        errors.push(self.error(site, &outcome, Some(Recovery::Truncated)));
        let green = self.finish(frag);
        let reuse = self.reuse_table();
        Recovered { green, errors, reuse }
    }

    fn accepted(&self, repairs: Vec<Repair>, outcome: Outcome, recovery: Recovery) -> Accepted {
        Accepted {
            repairs,
            outcome,
            recovery,
        }
    }

    /// Succeeded, or failed after significant token `past`.
    fn progressed(&self, outcome: &Outcome, past: usize) -> bool {
        outcome.success() || (outcome.overflow.is_none() && self.real(outcome.failure.pos) > past)
    }

    fn can_insert(&self, repairs: &[Repair], site: usize) -> bool {
        let here = repairs
            .iter()
            .filter(|repair| matches!(repair, Repair::Insert { at, .. } if *at == site))
            .count();
        here < self.config.max_insertions_per_position
    }

    /// Candidate ends of a skipped span starting at `site`, ascending.
    fn sync_points(&self, site: usize) -> Vec<usize> {
        let n = self.source.len();
        let sync = self.automaton.sync_tokens();
        let mut points = Vec::new();
        if sync.is_empty() {
            points.extend(site + 1..=(site + self.config.sync_window).min(n));
        } else {
            let mut found = 0;
            for index in site..n {
                if found == self.config.sync_window {
                    break;
                }
                if sync.contains(self.source.kind(index)) {
                    found += 1;
                    points.push(index);
                    points.push(index + 1);
                }
            }
            points.retain(|&point| point > site);
        }
        points.push(n);
        points.dedup();
        points
    }

    fn name(&self, kind: SyntaxKind) -> SmolStr {
        if kind == SyntaxKind::EOF {
            SmolStr::new_static("end of input")
        } else {
            SmolStr::from(self.automaton.kind_name(kind))
        }
    }

    fn error(&self, site: usize, outcome: &Outcome, recovery: Option<Recovery>) -> SyntaxError {
        if outcome.overflow.is_some() {
            let mut builder = SyntaxError::builder(ErrorCode::E0205).range(self.range(site));
            if let Some(recovery) = recovery {
                builder = builder.recovery(recovery);
            }
            return builder.build();
        }
        let failure = &outcome.failure;
        let found = self.source.kind(site);
        let code = if found == SyntaxKind::EOF {
            ErrorCode::E0203
        } else if found == SyntaxKind::UNKNOWN {
            ErrorCode::E0101
        } else if matches!(recovery, Some(Recovery::Inserted(_))) {
            ErrorCode::E0202
        } else {
            ErrorCode::E0201
        };
        let range = self.range(site);
        let expected: Vec<SmolStr> = failure.expected.iter().map(|kind| self.name(kind)).collect();
        let found = if found == SyntaxKind::EOF {
            "end of input".to_string()
        } else {
            format!("`{}`", &self.text[range])
        };
        let mut builder = SyntaxError::builder(code)
            .message(format!("expected {}, found {}", join(&expected), found))
            .range(range)
            .expected(expected);
        if let Some(recovery) = recovery {
            builder = builder.recovery(recovery);
        }
        builder.build()
    }

    /// Give up: the whole input becomes one `ERROR` node under the root.
    ///
    /// Errors of earlier repairs no longer describe the tree, so only the
    /// first error site is kept.
    fn abandon(self, errors: Vec<SyntaxError>, current: Option<(usize, Outcome)>) -> Recovered {
        let mut error = match (errors.into_iter().next(), current) {
            (Some(first), _) => first,
            (None, Some((site, outcome))) => self.error(site, &outcome, None),
            (None, None) => SyntaxError::builder(ErrorCode::E0204).build(),
        };
        error.recovery = Some(Recovery::Abandoned);
        tracing::debug!(offset = u32::from(error.offset()), "parse abandoned");
        let error_node = GreenNode::new(SyntaxKind::ERROR.into(), self.source.all());
        let green = GreenNode::new(
            self.automaton.start_kind().into(),
            vec![NodeOrToken::Node(error_node)],
        );
        Recovered {
            green,
            errors: vec![error],
            reuse: Vec::new(),
        }
    }

    /// Memo entries that only looked at unrepaired tokens, by significant token index.
    fn reuse_table(&self) -> Vec<ReuseEntry> {
        let tokens = &self.tokens;
        let mut table = Vec::new();
        for (&(rule, pos, min), entry) in &self.memo {
            let examined = pos..entry.lookahead.max(pos + 1).min(tokens.len());
            if pos >= tokens.len() || tokens[examined].iter().any(VTok::is_repaired) {
                continue;
            }
            let index = |end: usize| if end > pos { tokens[end - 1].at + 1 } else { tokens[pos].at };
            let result = entry
                .result
                .as_ref()
                .map(|(frag, end)| (frag.clone(), index(*end)));
            let failure = if entry.failure.is_none() {
                Failure::default()
            } else {
                Failure {
                    pos: tokens[entry.failure.pos].at,
                    expected: entry.failure.expected.clone(),
                }
            };
            let lookahead = if entry.lookahead > pos { index(entry.lookahead) } else { 0 };
            table.push(ReuseEntry {
                key: (rule, tokens[pos].at, min),
                entry: MemoEntry {
                    result,
                    failure,
                    lookahead,
                },
            });
        }
        table.sort_by_key(|reuse| (reuse.key.1, reuse.key.0, reuse.key.2));
        table
    }
}

/// `repairs` followed by `extra`, kept in position order. A skip that starts
/// before earlier repairs swallows them.
fn with<const N: usize>(repairs: &[Repair], extra: [Repair; N]) -> Vec<Repair> {
    let mut out = Vec::with_capacity(repairs.len() + N);
    out.extend_from_slice(repairs);
    out.extend(extra);
    out.sort_by_key(|repair| match *repair {
        Repair::Skip { from, .. } => from,
        Repair::Insert { at, .. } => at,
    });
    out
}

/// `a`, `a or b`, `a, b or c`
fn join(names: &[SmolStr]) -> String {
    match names {
        [] => "nothing".to_string(),
        [single] => single.to_string(),
        [init @ .., last] => format!(
            "{} or {}",
            init.iter().map(SmolStr::as_str).collect::<Vec<_>>().join(", "),
            last
        ),
    }
}
