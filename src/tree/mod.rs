//! Tree Model: read-only queries over parsed trees.
//!
//! Trees are rowan trees over [`GrammarLanguage`]. Navigation (`parent()`,
//! `children()`, `next_sibling()`, `text_range()`) comes from rowan; this
//! module adds what needs the grammar: trivia, position lookup, error sites
//! and the canonical S-expression dump.

mod sexp;

use crate::base::{LineIndex, Span, TextRange, TextSize};
use crate::compiler::{CompiledAutomaton, SyntaxKind};

pub use crate::compiler::{GrammarLanguage, SyntaxElement, SyntaxNode, SyntaxNodeChildren, SyntaxToken};
pub use sexp::to_sexp;

/// Whitespace, comments and end-of-input markers.
pub fn is_trivia(element: &SyntaxElement, automaton: &CompiledAutomaton) -> bool {
    element
        .as_token()
        .is_some_and(|token| automaton.is_trivia(token.kind()))
}

/// Child nodes and tokens of `node`, without trivia.
pub fn significant_children<'a>(
    node: &SyntaxNode,
    automaton: &'a CompiledAutomaton,
) -> impl Iterator<Item = SyntaxElement> + 'a {
    node.children_with_tokens()
        .filter(move |element| !is_trivia(element, automaton))
}

/// Trivia tokens directly in front of `token`, in source order.
pub fn leading_trivia(token: &SyntaxToken, automaton: &CompiledAutomaton) -> Vec<SyntaxToken> {
    let mut trivia = Vec::new();
    let mut current = token.prev_token();
    while let Some(previous) = current {
        if !automaton.is_trivia(previous.kind()) {
            break;
        }
        current = previous.prev_token();
        trivia.push(previous);
    }
    trivia.reverse();
    trivia
}

/// Smallest element whose range contains `offset`.
///
/// A zero-width element contains its start offset. Between elements of
/// the same size the later one wins, so a `MISSING` node is found in front
/// of the token that follows it. The end offset of the root maps to the root.
pub fn node_at(root: &SyntaxNode, offset: TextSize) -> Option<SyntaxElement> {
    let range = root.text_range();
    if !(hits(range, offset) || offset == range.end()) {
        return None;
    }
    let mut current = root.clone();
    loop {
        let mut best: Option<SyntaxElement> = None;
        for child in current.children_with_tokens() {
            let child_range = child.text_range();
            if !hits(child_range, offset) {
                continue;
            }
            if best
                .as_ref()
                .is_none_or(|best| child_range.len() <= best.text_range().len())
            {
                best = Some(child);
            }
        }
        match best {
            Some(SyntaxElement::Node(node)) => current = node,
            Some(token) => return Some(token),
            None => return Some(SyntaxElement::Node(current)),
        }
    }
}

fn hits(range: TextRange, offset: TextSize) -> bool {
    range.contains(offset) || (range.is_empty() && range.start() == offset)
}

/// Every `ERROR` and `MISSING` node, in source order.
pub fn error_nodes(root: &SyntaxNode) -> Vec<SyntaxNode> {
    root.descendants()
        .filter(|node| matches!(node.kind(), SyntaxKind::ERROR | SyntaxKind::MISSING))
        .collect()
}

/// Line/column span of a byte range.
pub fn span(range: TextRange, index: &LineIndex) -> Span {
    Span::new(index.position(range.start()), index.position(range.end()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::compiler::compile;
    use crate::grammar::Grammar;
    use crate::parser::Parser;

    const LIST: &str = r##"
        @extras ws comment
        list : "[" item* "]" ;
        item : number | list ;
        number : /[0-9]+/ ;
        ws : /\s+/ ;
        comment : token("#" /[^\n]*/) ;
    "##;

    fn parse(text: &str) -> (Arc<CompiledAutomaton>, SyntaxNode) {
        let automaton = Arc::new(compile(&Grammar::from_notation(LIST).unwrap()).unwrap());
        let parse = Parser::new(automaton.clone()).parse(text);
        (automaton, parse.syntax())
    }

    #[test]
    fn test_significant_children_skip_trivia() {
        let (automaton, root) = parse("[ 1 2 ]");
        let kinds: Vec<_> = significant_children(&root, &automaton)
            .map(|element| automaton.kind_name(element.kind()))
            .collect();
        assert_eq!(kinds, ["\"[\"", "item", "item", "\"]\""]);
        assert_eq!(root.children_with_tokens().count(), 7);
    }

    #[test]
    fn test_leading_trivia() {
        let (automaton, root) = parse("[ # note\n 1]");
        let number = root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.text() == "1")
            .unwrap();
        let trivia: Vec<_> = leading_trivia(&number, &automaton)
            .iter()
            .map(|token| token.text().to_string())
            .collect();
        assert_eq!(trivia, [" ", "# note", "\n "]);
    }

    #[test]
    fn test_node_at() {
        let (automaton, root) = parse("[ 12 ]");
        let found = node_at(&root, TextSize::new(3)).unwrap();
        assert_eq!(found.kind(), automaton.kind("number").unwrap());
        assert_eq!(found.text_range(), TextRange::new(2.into(), 4.into()));
        let end = node_at(&root, TextSize::new(6)).unwrap();
        assert_eq!(end.kind(), automaton.start_kind());
        assert!(node_at(&root, TextSize::new(7)).is_none());
    }

    #[test]
    fn test_error_nodes_and_span() {
        let (_, root) = parse("[ 1\n  x ]");
        let errors = error_nodes(&root);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), SyntaxKind::ERROR);
        let index = LineIndex::new("[ 1\n  x ]");
        let span = span(errors[0].text_range(), &index);
        assert_eq!(span, Span::from_coords(1, 2, 1, 3));
    }
}
