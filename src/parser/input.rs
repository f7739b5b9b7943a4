//! Token input of the parsing engine.
//!
//! [`Source`] indexes the significant tokens of a [`Lexed`] input and the
//! trivia in front of each of them. Error recovery never edits tokens; it
//! describes [`Repair`]s, and [`stream`] lays them over the source as a
//! virtual token stream the engine runs on.

use std::ops::Range;

use rowan::{GreenNode, GreenToken, NodeOrToken};

use crate::compiler::SyntaxKind;
use crate::lexer::Lexed;

pub(crate) type Green = NodeOrToken<GreenNode, GreenToken>;

/// Significant tokens of a lexed input, with the trivia leading each one.
///
/// Index `n` (one past the last significant token) stands for end of input;
/// its trivia is the trailing trivia of the file.
pub(crate) struct Source<'a> {
    lexed: &'a Lexed,
    greens: Vec<GreenToken>,
    significant: Vec<usize>,
    trivia: Vec<Range<usize>>,
}

impl<'a> Source<'a> {
    pub(crate) fn new(text: &str, lexed: &'a Lexed) -> Self {
        let tokens = lexed.tokens();
        let greens = tokens
            .iter()
            .map(|token| GreenToken::new(token.kind.into(), token.text(text)))
            .collect();
        let mut significant = Vec::new();
        let mut trivia = Vec::new();
        let mut run_start = 0;
        for (index, token) in tokens.iter().enumerate() {
            if token.is_extra {
                continue;
            }
            trivia.push(run_start..index);
            significant.push(index);
            run_start = index + 1;
        }
        trivia.push(run_start..tokens.len());
        Self {
            lexed,
            greens,
            significant,
            trivia,
        }
    }

    /// Number of significant tokens.
    pub(crate) fn len(&self) -> usize {
        self.significant.len()
    }

    pub(crate) fn lexed(&self) -> &'a Lexed {
        self.lexed
    }

    pub(crate) fn kind(&self, index: usize) -> SyntaxKind {
        match self.significant.get(index) {
            Some(&token) => self.lexed.tokens()[token].kind,
            None => SyntaxKind::EOF,
        }
    }

    /// Index into [`Lexed::tokens`] of a significant token.
    pub(crate) fn token_index(&self, index: usize) -> Option<usize> {
        self.significant.get(index).copied()
    }

    fn token(&self, index: usize) -> Option<Green> {
        self.token_index(index)
            .map(|token| NodeOrToken::Token(self.greens[token].clone()))
    }

    fn trivia(&self, index: usize) -> impl Iterator<Item = Green> + '_ {
        self.trivia[index]
            .clone()
            .map(|token| NodeOrToken::Token(self.greens[token].clone()))
    }

    /// Lexed indices of the trivia leading a significant token (or end of input).
    #[cfg(test)]
    pub(crate) fn trivia_range(&self, index: usize) -> Range<usize> {
        self.trivia[index].clone()
    }

    /// Every token of the input, in order.
    pub(crate) fn all(&self) -> Vec<Green> {
        self.greens.iter().cloned().map(NodeOrToken::Token).collect()
    }

    /// `ERROR` node over the significant tokens `from..to` and the trivia between them.
    fn skipped(&self, from: usize, to: usize) -> Green {
        let mut children = Vec::new();
        for index in from..to {
            if index > from {
                children.extend(self.trivia(index));
            }
            children.extend(self.token(index));
        }
        NodeOrToken::Node(GreenNode::new(SyntaxKind::ERROR.into(), children))
    }
}

/// An edit error recovery applies to the significant token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Repair {
    /// Wrap the significant tokens `from..to` in an `ERROR` node.
    Skip { from: usize, to: usize },
    /// Put a zero-width token of `kind` in front of significant token `at`.
    Insert { at: usize, kind: SyntaxKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lead {
    Trivia(usize),
    Skipped { from: usize, to: usize },
}

/// One token of the virtual stream.
#[derive(Debug, Clone)]
pub(crate) struct VTok {
    pub(crate) kind: SyntaxKind,
    /// Significant token this stands for, or is inserted in front of.
    pub(crate) at: usize,
    /// `false` for tokens inserted by recovery.
    pub(crate) real: bool,
    lead: Vec<Lead>,
    /// Trivia and skipped input in front of the token.
    pub(crate) leading: Vec<Green>,
    /// `None` only for end of input.
    pub(crate) element: Option<Green>,
}

impl VTok {
    /// Inserted, or preceded by skipped input.
    pub(crate) fn is_repaired(&self) -> bool {
        !self.real || self.lead.iter().any(|lead| matches!(lead, Lead::Skipped { .. }))
    }

    /// Same token with the same leading input.
    pub(crate) fn same_as(&self, other: &VTok) -> bool {
        self.kind == other.kind && self.at == other.at && self.real == other.real && self.lead == other.lead
    }
}

/// Lay `repairs` (ordered by position) over the source. Always ends with an `EOF` token.
pub(crate) fn stream(source: &Source<'_>, repairs: &[Repair]) -> Vec<VTok> {
    let n = source.len();
    let mut out = Vec::with_capacity(n + 1 + repairs.len());
    let mut pending: Vec<Lead> = Vec::new();
    let mut next = 0;
    let mut index = 0;
    while index <= n {
        while let Some(&Repair::Insert { at, kind }) = repairs.get(next) {
            if at > index {
                break;
            }
            next += 1;
            if at < index {
                // Swallowed by an earlier skip
                continue;
            }
            let lead = std::mem::take(&mut pending);
            out.push(VTok {
                kind,
                at,
                real: false,
                leading: leading(source, &lead),
                lead,
                element: Some(missing(kind)),
            });
        }
        if let Some(&Repair::Skip { from, to }) = repairs.get(next) {
            if from <= index {
                next += 1;
                if from == index && to > index && index < n {
                    let to = to.min(n);
                    pending.push(Lead::Trivia(index));
                    pending.push(Lead::Skipped { from: index, to });
                    index = to;
                }
                continue;
            }
        }
        pending.push(Lead::Trivia(index));
        let lead = std::mem::take(&mut pending);
        out.push(VTok {
            kind: source.kind(index),
            at: index,
            real: true,
            leading: leading(source, &lead),
            lead,
            element: source.token(index),
        });
        index += 1;
    }
    out
}

/// Length of the common prefix of two streams.
pub(crate) fn first_difference(old: &[VTok], new: &[VTok]) -> usize {
    old.iter()
        .zip(new)
        .take_while(|(old, new)| old.same_as(new))
        .count()
}

fn leading(source: &Source<'_>, lead: &[Lead]) -> Vec<Green> {
    let mut out = Vec::new();
    for item in lead {
        match *item {
            Lead::Trivia(index) => out.extend(source.trivia(index)),
            Lead::Skipped { from, to } => out.push(source.skipped(from, to)),
        }
    }
    out
}

/// `MISSING` node around a zero-width token.
fn missing(kind: SyntaxKind) -> Green {
    NodeOrToken::Node(GreenNode::new(
        SyntaxKind::MISSING.into(),
        vec![NodeOrToken::Token(GreenToken::new(kind.into(), ""))],
    ))
}
