//! Ordered-choice interpreter over the lowered program.
//!
//! Every rule call is memoized by `(rule, position, min precedence)`. An
//! entry remembers how far the call looked ahead and the farthest failure
//! it saw, so entries can be kept across repair trials and re-parses for
//! as long as the tokens they looked at are unchanged.

use std::mem;

use rowan::{GreenNode, NodeOrToken};
use rustc_hash::FxHashMap;

use super::ParserConfig;
use super::input::{Green, VTok};
use crate::compiler::{CompiledAutomaton, MIN_PREC, Op, OpId, Program, RuleBody, RuleId, SyntaxKind, TokenSet};

/// Farthest position where a token test failed, and the tokens tested there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Failure {
    pub(crate) pos: usize,
    pub(crate) expected: TokenSet,
}

impl Failure {
    pub(crate) fn is_none(&self) -> bool {
        self.expected.is_empty()
    }

    fn note(&mut self, pos: usize, expected: &TokenSet) {
        if expected.is_empty() || (pos < self.pos && !self.is_none()) {
            return;
        }
        if pos > self.pos || self.is_none() {
            self.pos = pos;
            self.expected = expected.clone();
        } else {
            self.expected.union_with(expected);
        }
    }

    fn merge(&mut self, other: &Failure) {
        if !other.is_none() {
            self.note(other.pos, &other.expected);
        }
    }
}

/// Matched input: trivia in front of the first token, then the elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Frag {
    pub(crate) leading: Vec<Green>,
    pub(crate) elems: Vec<Green>,
}

impl Frag {
    fn is_blank(&self) -> bool {
        self.leading.is_empty() && self.elems.is_empty()
    }

    fn append(&mut self, other: Frag) {
        if self.is_blank() {
            *self = other;
        } else {
            self.elems.extend(other.leading);
            self.elems.extend(other.elems);
        }
    }

    /// Wrap the elements in a node; leading trivia stays outside.
    fn wrap(self, kind: SyntaxKind) -> Frag {
        Frag {
            leading: self.leading,
            elems: vec![NodeOrToken::Node(GreenNode::new(kind.into(), self.elems))],
        }
    }
}

/// Stack left before a rule call moves onto a fresh segment, and that segment's size.
const RED_ZONE: usize = 128 * 1024;
const STACK_SIZE: usize = 4 * 1024 * 1024;

pub(crate) type MemoKey = (RuleId, usize, i32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemoEntry {
    pub(crate) result: Option<(Frag, usize)>,
    pub(crate) failure: Failure,
    /// One past the last position the call examined.
    pub(crate) lookahead: usize,
}

pub(crate) type Memo = FxHashMap<MemoKey, MemoEntry>;

/// Where the call depth limit was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Overflow {
    /// Position of the call that went over the limit.
    pub(crate) at: usize,
    /// Position of the call halfway down the stack at that moment. Input
    /// before it nests at most half as deep as the limit allows.
    pub(crate) from: usize,
}

/// Result of one run over a token stream.
#[derive(Debug)]
pub(crate) struct Outcome {
    /// Matched start rule, unwrapped, when the whole stream was consumed.
    pub(crate) frag: Option<Frag>,
    pub(crate) failure: Failure,
    pub(crate) overflow: Option<Overflow>,
}

impl Outcome {
    pub(crate) fn success(&self) -> bool {
        self.frag.is_some()
    }
}

pub(crate) struct Engine<'a> {
    automaton: &'a CompiledAutomaton,
    config: &'a ParserConfig,
    tokens: &'a [VTok],
    memo: &'a mut Memo,
    failure: Failure,
    lookahead: usize,
    /// Start position of every active rule call, outermost first.
    frames: Vec<usize>,
    tainted: bool,
    overflow: Option<Overflow>,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(
        automaton: &'a CompiledAutomaton,
        config: &'a ParserConfig,
        tokens: &'a [VTok],
        memo: &'a mut Memo,
    ) -> Self {
        Self {
            automaton,
            config,
            tokens,
            memo,
            failure: Failure::default(),
            lookahead: 0,
            frames: Vec::new(),
            tainted: false,
            overflow: None,
        }
    }

    fn program(&self) -> &'a Program {
        self.automaton.program()
    }

    /// Match the start rule against the whole stream.
    pub(crate) fn run(mut self) -> Outcome {
        let start = self.automaton.start_rule();
        let frag = match self.rule_body(start, 0, MIN_PREC) {
            Some((frag, end)) if self.kind(end) == SyntaxKind::EOF => Some(frag),
            Some((_, end)) => {
                self.fail(end, &TokenSet::single(SyntaxKind::EOF));
                None
            }
            None => None,
        };
        tracing::trace!(
            tokens = self.tokens.len(),
            memo = self.memo.len(),
            success = frag.is_some(),
            failure = self.failure.pos,
            "parse run"
        );
        Outcome {
            frag,
            failure: self.failure,
            overflow: self.overflow,
        }
    }

    fn kind(&mut self, pos: usize) -> SyntaxKind {
        self.lookahead = self.lookahead.max(pos + 1);
        self.tokens.get(pos).map_or(SyntaxKind::EOF, |tok| tok.kind)
    }

    fn fail(&mut self, pos: usize, expected: &TokenSet) {
        self.failure.note(pos, expected);
    }

    fn call(&mut self, rule: RuleId, pos: usize, min: i32) -> Option<(Frag, usize)> {
        let program = self.program();
        let min = if program.rule(rule).is_left_recursive() { min } else { MIN_PREC };
        let key = (rule, pos, min);
        if let Some(entry) = self.memo.get(&key) {
            self.failure.merge(&entry.failure);
            self.lookahead = self.lookahead.max(entry.lookahead);
            return entry.result.clone();
        }
        if self.frames.len() >= self.config.max_depth {
            self.tainted = true;
            let from = self.frames.get(self.frames.len() / 2).copied().unwrap_or(pos);
            self.overflow.get_or_insert(Overflow { at: pos, from });
            return None;
        }

        let outer_failure = mem::take(&mut self.failure);
        let outer_lookahead = mem::take(&mut self.lookahead);
        let outer_tainted = mem::take(&mut self.tainted);
        self.frames.push(pos);
        let result = stacker::maybe_grow(RED_ZONE, STACK_SIZE, || self.rule_body(rule, pos, min));
        let result = result.map(|(frag, end)| {
            let rule = program.rule(rule);
            let frag = if rule.hidden { frag } else { frag.wrap(rule.kind) };
            (frag, end)
        });
        self.frames.pop();

        if self.config.memoize && !self.tainted {
            self.memo.insert(
                key,
                MemoEntry {
                    result: result.clone(),
                    failure: self.failure.clone(),
                    lookahead: self.lookahead,
                },
            );
        }
        let inner = mem::replace(&mut self.failure, outer_failure);
        self.failure.merge(&inner);
        self.lookahead = self.lookahead.max(outer_lookahead);
        self.tainted |= outer_tainted;
        result
    }

    /// Match a rule body without wrapping it in the rule's node.
    fn rule_body(&mut self, rule: RuleId, pos: usize, min: i32) -> Option<(Frag, usize)> {
        let rule = self.program().rule(rule);
        match &rule.body {
            RuleBody::Plain(op) => self.eval(*op, pos),
            RuleBody::LeftRecursive { base, tails } => {
                let (mut acc, mut pos) = self.eval(*base, pos)?;
                'grow: loop {
                    for tail in tails {
                        if tail.prec < min {
                            continue;
                        }
                        let Some((next, end)) = self.eval(tail.op, pos) else {
                            continue;
                        };
                        if end == pos {
                            continue;
                        }
                        acc = if rule.hidden { acc } else { acc.wrap(rule.kind) };
                        acc.append(next);
                        pos = end;
                        continue 'grow;
                    }
                    break;
                }
                Some((acc, pos))
            }
        }
    }

    fn eval(&mut self, op: OpId, pos: usize) -> Option<(Frag, usize)> {
        let program = self.program();
        match program.op(op) {
            Op::Token(kind) => {
                if self.kind(pos) != *kind {
                    self.fail(pos, &TokenSet::single(*kind));
                    return None;
                }
                let tok = &self.tokens[pos];
                let frag = Frag {
                    leading: tok.leading.clone(),
                    elems: tok.element.iter().cloned().collect(),
                };
                Some((frag, pos + 1))
            }
            Op::Seq(items) => {
                let mut acc = Frag::default();
                let mut end = pos;
                for item in items {
                    let (frag, next) = self.eval(*item, end)?;
                    acc.append(frag);
                    end = next;
                }
                Some((acc, end))
            }
            Op::Choice(alternatives) => {
                let current = self.kind(pos);
                for alternative in alternatives {
                    if !program.nullable(*alternative) && !program.first(*alternative).contains(current) {
                        self.fail(pos, program.first(*alternative));
                        continue;
                    }
                    if let Some(found) = self.eval(*alternative, pos) {
                        return Some(found);
                    }
                }
                None
            }
            Op::Repeat { inner, min } => {
                let mut acc = Frag::default();
                let mut count = 0usize;
                let mut end = pos;
                while let Some((frag, next)) = self.eval(*inner, end) {
                    if next == end {
                        if count < usize::from(*min) {
                            acc.append(frag);
                            count += 1;
                        }
                        break;
                    }
                    acc.append(frag);
                    count += 1;
                    end = next;
                }
                (count >= usize::from(*min)).then_some((acc, end))
            }
            Op::Optional(inner) => Some(self.eval(*inner, pos).unwrap_or((Frag::default(), pos))),
            Op::Blank => Some((Frag::default(), pos)),
            Op::Call { rule, min_prec } => self.call(*rule, pos, *min_prec),
        }
    }
}
