//! Canonical S-expression dump, for tests and debugging.
//!
//! ```text
//! (a "a" (ERROR "c") (b (MISSING "b")))
//! ```
//!
//! Named nodes print as `(name ...)`, named tokens as `(name)` and anonymous
//! or hidden tokens as their quoted text. A `MISSING` node prints the kind of
//! the token it stands for. Trivia is left out.

use crate::compiler::{CompiledAutomaton, KindClass, SyntaxKind, SyntaxNode, SyntaxToken};

pub fn to_sexp(node: &SyntaxNode, automaton: &CompiledAutomaton) -> String {
    let mut out = String::new();
    write_node(node, automaton, &mut out);
    out
}

fn write_node(node: &SyntaxNode, automaton: &CompiledAutomaton, out: &mut String) {
    out.push('(');
    out.push_str(automaton.kinds().name(node.kind()));
    if node.kind() == SyntaxKind::MISSING {
        for token in node.children_with_tokens().filter_map(|element| element.into_token()) {
            out.push(' ');
            out.push_str(&automaton.kind_name(token.kind()));
        }
        out.push(')');
        return;
    }
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(child) => {
                out.push(' ');
                write_node(&child, automaton, out);
            }
            rowan::NodeOrToken::Token(token) => {
                if automaton.is_trivia(token.kind()) {
                    continue;
                }
                out.push(' ');
                write_token(&token, automaton, out);
            }
        }
    }
    out.push(')');
}

fn write_token(token: &SyntaxToken, automaton: &CompiledAutomaton, out: &mut String) {
    let named = automaton
        .kind_info(token.kind())
        .is_some_and(|info| matches!(info.class, KindClass::NamedToken { hidden: false }));
    if named {
        out.push('(');
        out.push_str(automaton.kinds().name(token.kind()));
        out.push(')');
    } else {
        out.push_str(&format!("{:?}", token.text()));
    }
}
