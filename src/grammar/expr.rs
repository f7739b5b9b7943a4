//! Combinator expressions that make up a rule body.

use smol_str::SmolStr;

/// Associativity attached to a precedence annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// A rule body, built from primitive combinators.
///
/// `Choice` is ordered: alternatives are tried in declaration order and the
/// first one that matches wins. References are resolved by name when the
/// grammar is compiled, so mutually recursive rules need no cyclic values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleExpr {
    /// Exact text.
    Literal(SmolStr),
    /// A regular expression (`regex` crate syntax).
    Pattern(SmolStr),
    Seq(Vec<RuleExpr>),
    Choice(Vec<RuleExpr>),
    /// Repetition with a minimum count of 0 or 1.
    Repeat { inner: Box<RuleExpr>, min: u8 },
    Optional(Box<RuleExpr>),
    /// Lazy link to another rule by name.
    Reference(SmolStr),
    /// Matches the empty string.
    Blank,
    /// Collapses a lexical sub-expression into a single token.
    Token(Box<RuleExpr>),
    /// Operator precedence for left-recursive alternatives.
    Prec {
        level: i32,
        assoc: Assoc,
        inner: Box<RuleExpr>,
    },
    /// A block token that nests, such as `/+ /+ inner +/ outer +/`.
    Nested { open: SmolStr, close: SmolStr },
    /// A string whose closing delimiter is chosen by the text itself,
    /// such as `q"(...)"`, `q"[...]"`, `q"/.../"` or `q"EOS\n...\nEOS"`.
    Delimited { prefix: SmolStr, suffix: SmolStr },
    /// A quoted token with backslash escapes, such as `"a\"b"`.
    Quoted { open: SmolStr, close: SmolStr },
}

pub fn literal(text: impl Into<SmolStr>) -> RuleExpr {
    RuleExpr::Literal(text.into())
}

pub fn pattern(regex: impl Into<SmolStr>) -> RuleExpr {
    RuleExpr::Pattern(regex.into())
}

pub fn seq(items: impl IntoIterator<Item = RuleExpr>) -> RuleExpr {
    RuleExpr::Seq(items.into_iter().collect())
}

pub fn choice(alternatives: impl IntoIterator<Item = RuleExpr>) -> RuleExpr {
    RuleExpr::Choice(alternatives.into_iter().collect())
}

pub fn repeat(inner: RuleExpr) -> RuleExpr {
    RuleExpr::Repeat {
        inner: Box::new(inner),
        min: 0,
    }
}

pub fn repeat1(inner: RuleExpr) -> RuleExpr {
    RuleExpr::Repeat {
        inner: Box::new(inner),
        min: 1,
    }
}

pub fn optional(inner: RuleExpr) -> RuleExpr {
    RuleExpr::Optional(Box::new(inner))
}

pub fn reference(name: impl Into<SmolStr>) -> RuleExpr {
    RuleExpr::Reference(name.into())
}

pub fn blank() -> RuleExpr {
    RuleExpr::Blank
}

pub fn token(inner: RuleExpr) -> RuleExpr {
    RuleExpr::Token(Box::new(inner))
}

pub fn prec(level: i32, inner: RuleExpr) -> RuleExpr {
    RuleExpr::Prec {
        level,
        assoc: Assoc::None,
        inner: Box::new(inner),
    }
}

pub fn prec_left(level: i32, inner: RuleExpr) -> RuleExpr {
    RuleExpr::Prec {
        level,
        assoc: Assoc::Left,
        inner: Box::new(inner),
    }
}

pub fn prec_right(level: i32, inner: RuleExpr) -> RuleExpr {
    RuleExpr::Prec {
        level,
        assoc: Assoc::Right,
        inner: Box::new(inner),
    }
}

pub fn nested(open: impl Into<SmolStr>, close: impl Into<SmolStr>) -> RuleExpr {
    RuleExpr::Nested {
        open: open.into(),
        close: close.into(),
    }
}

pub fn quoted(open: impl Into<SmolStr>, close: impl Into<SmolStr>) -> RuleExpr {
    RuleExpr::Quoted {
        open: open.into(),
        close: close.into(),
    }
}

pub fn delimited(prefix: impl Into<SmolStr>, suffix: impl Into<SmolStr>) -> RuleExpr {
    RuleExpr::Delimited {
        prefix: prefix.into(),
        suffix: suffix.into(),
    }
}

impl RuleExpr {
    /// Visit every `Reference` name in this expression, in order.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a SmolStr)) {
        match self {
            RuleExpr::Reference(name) => f(name),
            RuleExpr::Seq(items) | RuleExpr::Choice(items) => {
                for item in items {
                    item.for_each_reference(f);
                }
            }
            RuleExpr::Repeat { inner, .. }
            | RuleExpr::Optional(inner)
            | RuleExpr::Token(inner)
            | RuleExpr::Prec { inner, .. } => inner.for_each_reference(f),
            RuleExpr::Literal(_)
            | RuleExpr::Pattern(_)
            | RuleExpr::Blank
            | RuleExpr::Nested { .. }
            | RuleExpr::Delimited { .. }
            | RuleExpr::Quoted { .. } => {}
        }
    }

    /// Terminals the lexer matches with a dedicated scanner or regex.
    pub fn is_lexical_leaf(&self) -> bool {
        matches!(
            self,
            RuleExpr::Pattern(_)
                | RuleExpr::Token(_)
                | RuleExpr::Nested { .. }
                | RuleExpr::Delimited { .. }
                | RuleExpr::Quoted { .. }
        )
    }

    /// Strip `Prec` wrappers.
    pub fn unwrap_prec(&self) -> &RuleExpr {
        match self {
            RuleExpr::Prec { inner, .. } => inner.unwrap_prec(),
            other => other,
        }
    }
}
