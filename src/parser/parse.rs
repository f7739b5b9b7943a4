//! Parse result

use std::sync::Arc;

use rowan::GreenNode;

use super::errors::SyntaxError;
use super::recovery::ReuseEntry;
use crate::base::TextSize;
use crate::compiler::{CompiledAutomaton, SyntaxElement, SyntaxNode};
use crate::lexer::Lexed;
use crate::tree;

/// Parse result containing the green tree and any errors
///
/// The tree always spans the whole input, whatever the errors. A `Parse`
/// also keeps what [`Parser::reparse`](super::Parser::reparse) needs to
/// reuse work after an edit.
#[derive(Debug, Clone)]
pub struct Parse {
    pub(crate) green: GreenNode,
    pub(crate) errors: Vec<SyntaxError>,
    pub(crate) automaton: Arc<CompiledAutomaton>,
    pub(crate) lexed: Arc<Lexed>,
    pub(crate) reuse: Arc<[ReuseEntry]>,
    pub(crate) reused: usize,
}

impl Parse {
    /// Get the root syntax node
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Lexical and syntax errors, ordered by offset.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// The parsed text, rebuilt from the tree.
    pub fn text(&self) -> String {
        self.syntax().to_string()
    }

    pub fn automaton(&self) -> &Arc<CompiledAutomaton> {
        &self.automaton
    }

    pub fn lexed(&self) -> &Lexed {
        &self.lexed
    }

    /// Number of memo entries carried over from the previous parse.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Smallest element containing `offset`.
    pub fn node_at(&self, offset: TextSize) -> Option<SyntaxElement> {
        tree::node_at(&self.syntax(), offset)
    }

    /// Canonical S-expression of the tree.
    pub fn to_sexp(&self) -> String {
        tree::to_sexp(&self.syntax(), &self.automaton)
    }
}
