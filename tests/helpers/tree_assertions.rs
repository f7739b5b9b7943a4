//! Assertions over parse results.

use gramma::{Parse, SyntaxKind};

/// Assert the canonical S-expression, printing the errors on mismatch.
pub fn assert_sexp(parse: &Parse, expected: &str) {
    assert_eq!(
        parse.to_sexp(),
        expected,
        "errors: {:?}",
        parse.errors().iter().map(ToString::to_string).collect::<Vec<_>>()
    );
}

/// Assert that the tree reproduces the input exactly.
pub fn assert_lossless(parse: &Parse, input: &str) {
    assert_eq!(parse.text(), input);
    assert_eq!(u32::from(parse.syntax().text_range().len()) as usize, input.len());
}

/// Number of nodes of `kind` in the tree.
pub fn count_nodes(parse: &Parse, kind: SyntaxKind) -> usize {
    parse.syntax().descendants().filter(|node| node.kind() == kind).count()
}
