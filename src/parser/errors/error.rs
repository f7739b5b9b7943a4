//! Syntax error types
//!
//! Provides rich error information including:
//! - Error codes for categorization
//! - Severity levels
//! - The tokens the parser expected at the error site
//! - The recovery applied to continue parsing
//! - Hints and related source locations

use std::fmt;

use rowan::{TextRange, TextSize};
use smol_str::SmolStr;

use super::codes::ErrorCode;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// A hard error that prevents valid parsing
    #[default]
    Error,
    /// A warning that doesn't prevent parsing
    Warning,
    /// An informational hint
    Hint,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// How the parser got past an error site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// The offending token was wrapped in an `ERROR` node.
    Skipped,
    /// A zero-width token of this kind was inserted inside a `MISSING` node.
    Inserted(SmolStr),
    /// Tokens up to a synchronization point were wrapped in an `ERROR` node,
    /// followed by an optional insertion.
    Synchronized { inserted: Option<SmolStr> },
    /// Recovery stopped here: the rest of the input was wrapped in an
    /// `ERROR` node, completed by insertions at end of input if needed.
    Truncated,
    /// No repair worked; the input was wrapped in a single `ERROR` node.
    Abandoned,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped the unexpected token"),
            Self::Inserted(kind) => write!(f, "inserted missing {}", kind),
            Self::Synchronized { inserted: None } => f.write_str("skipped to a synchronization point"),
            Self::Synchronized {
                inserted: Some(kind),
            } => write!(f, "skipped to a synchronization point and inserted {}", kind),
            Self::Truncated => f.write_str("skipped the rest of the input"),
            Self::Abandoned => f.write_str("gave up"),
        }
    }
}

/// Related location information for an error
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelatedInfo {
    pub message: String,
    pub range: TextRange,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// A lexical or syntax error found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxError {
    /// Human-readable error message
    pub message: String,
    /// Source location
    pub range: TextRange,
    /// Categorized error code
    pub code: ErrorCode,
    /// Error severity
    pub severity: Severity,
    /// Display names of the tokens that would have been accepted, in kind order
    pub expected: Vec<SmolStr>,
    /// The repair that let parsing continue, if any
    pub recovery: Option<Recovery>,
    /// Optional suggestion for fixing the error
    pub hint: Option<String>,
    /// Related source locations
    pub related: Vec<RelatedInfo>,
}

impl SyntaxError {
    /// Create a new syntax error with minimal information
    pub fn new(message: impl Into<String>, range: TextRange, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            range,
            code,
            severity: Severity::Error,
            expected: vec![],
            recovery: None,
            hint: None,
            related: vec![],
        }
    }

    /// Create an error at a specific offset with zero-width range
    pub fn at_offset(message: impl Into<String>, offset: TextSize, code: ErrorCode) -> Self {
        Self::new(message, TextRange::empty(offset), code)
    }

    /// Create a builder for more complex error construction
    pub fn builder(code: ErrorCode) -> SyntaxErrorBuilder {
        SyntaxErrorBuilder::new(code)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn has_hint(&self) -> bool {
        self.hint.is_some()
    }

    pub fn is_lexical(&self) -> bool {
        self.code.is_lexical()
    }

    /// Offset where the error starts
    pub fn offset(&self) -> TextSize {
        self.range.start()
    }

    /// Format the error for display
    pub fn format(&self) -> String {
        let mut result = format!("{}: {}", self.code, self.message);
        if let Some(hint) = &self.hint {
            result.push_str(&format!("\n  hint: {}", hint));
        }
        result
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}..{}",
            self.code,
            self.message,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}

/// Builder for creating complex syntax errors
#[derive(Debug, Clone)]
pub struct SyntaxErrorBuilder {
    code: ErrorCode,
    message: Option<String>,
    range: Option<TextRange>,
    severity: Severity,
    expected: Vec<SmolStr>,
    recovery: Option<Recovery>,
    hint: Option<String>,
    related: Vec<RelatedInfo>,
}

impl SyntaxErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: None,
            range: None,
            severity: Severity::Error,
            expected: vec![],
            recovery: None,
            hint: None,
            related: vec![],
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn range(mut self, range: TextRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Set the offset (creates an empty range at that position)
    pub fn at_offset(mut self, offset: TextSize) -> Self {
        self.range = Some(TextRange::empty(offset));
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn expected(mut self, expected: impl IntoIterator<Item = SmolStr>) -> Self {
        self.expected = expected.into_iter().collect();
        self
    }

    pub fn recovery(mut self, recovery: Recovery) -> Self {
        self.recovery = Some(recovery);
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn related(mut self, message: impl Into<String>, range: TextRange) -> Self {
        self.related.push(RelatedInfo::new(message, range));
        self
    }

    /// Build the syntax error; a missing message falls back to the code's default.
    pub fn build(self) -> SyntaxError {
        SyntaxError {
            message: self
                .message
                .unwrap_or_else(|| self.code.default_message().to_string()),
            range: self
                .range
                .unwrap_or_else(|| TextRange::empty(TextSize::new(0))),
            code: self.code,
            severity: self.severity,
            expected: self.expected,
            recovery: self.recovery,
            hint: self.hint,
            related: self.related,
        }
    }
}
