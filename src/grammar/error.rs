//! Error types for grammar definition and compilation.
//!
//! All of these are raised before any text is parsed. None of them is
//! recoverable: a grammar that fails here never yields an automaton.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while assembling, loading or compiling a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// `define` was called twice for one name.
    #[error("Duplicate rule: `{0}` is already defined")]
    DuplicateRule(SmolStr),

    /// No start rule (or no rule at all) before compilation.
    #[error("Empty grammar: no start rule is set")]
    EmptyGrammar,

    /// A name used by `rule` does not resolve to any declared rule.
    #[error("Unresolved rule: `{reference}` (referenced from `{rule}`)")]
    UnresolvedRule { rule: SmolStr, reference: SmolStr },

    /// Alternatives that declaration order alone cannot disambiguate.
    #[error("Grammar conflict between {}: {reason}", join_names(.rules))]
    GrammarConflict { rules: Vec<SmolStr>, reason: String },

    /// A left-recursive cycle the engine cannot rewrite.
    #[error("Unsupported left recursion: {}", .cycle.join(" -> "))]
    LeftRecursion { cycle: Vec<SmolStr> },

    /// An extra rule that is not a token.
    #[error("Invalid extra `{name}`: {reason}")]
    InvalidExtra { name: SmolStr, reason: String },

    /// The word rule is not a token.
    #[error("Invalid word rule `{name}`: {reason}")]
    InvalidWord { name: SmolStr, reason: String },

    /// A malformed token expression.
    #[error("Invalid token in `{rule}`: {reason}")]
    InvalidToken { rule: SmolStr, reason: String },

    /// A pattern rejected by the regex engine.
    #[error("Invalid pattern /{pattern}/ in `{rule}`: {source}")]
    InvalidPattern {
        rule: SmolStr,
        pattern: SmolStr,
        #[source]
        source: regex::Error,
    },

    /// Malformed grammar notation text.
    #[error("Grammar notation error at {line}:{column}: {message}")]
    Notation {
        line: usize,
        column: usize,
        message: String,
    },

    /// Malformed grammar JSON.
    #[error("Grammar JSON error: {0}")]
    Json(String),
}

impl GrammarError {
    /// Create an unresolved-rule error.
    pub fn unresolved(rule: impl Into<SmolStr>, reference: impl Into<SmolStr>) -> Self {
        Self::UnresolvedRule {
            rule: rule.into(),
            reference: reference.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(rules: Vec<SmolStr>, reason: impl Into<String>) -> Self {
        Self::GrammarConflict {
            rules,
            reason: reason.into(),
        }
    }

    /// Names of the rules this error is about, for reporting to grammar authors.
    pub fn rule_names(&self) -> Vec<&str> {
        match self {
            Self::DuplicateRule(name) => vec![name.as_str()],
            Self::UnresolvedRule { rule, reference } => vec![rule.as_str(), reference.as_str()],
            Self::GrammarConflict { rules, .. } => rules.iter().map(SmolStr::as_str).collect(),
            Self::LeftRecursion { cycle } => cycle.iter().map(SmolStr::as_str).collect(),
            Self::InvalidExtra { name, .. } | Self::InvalidWord { name, .. } => vec![name.as_str()],
            Self::InvalidToken { rule, .. } | Self::InvalidPattern { rule, .. } => {
                vec![rule.as_str()]
            }
            Self::EmptyGrammar | Self::Notation { .. } | Self::Json(_) => vec![],
        }
    }
}

fn join_names(names: &[SmolStr]) -> String {
    names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ")
}
