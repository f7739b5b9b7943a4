//! Error code definitions for parse diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (found while tokenizing)
//! - E02xx: Syntax errors (found by the parsing engine)

use std::fmt;

/// Error codes for parse diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors
    // =========================================================================
    /// Characters that no terminal of the grammar matches
    E0101,
    /// Unterminated delimited or quoted string
    E0102,
    /// Unterminated nested block comment
    E0103,

    // =========================================================================
    // E02xx: Syntax errors
    // =========================================================================
    /// Unexpected token
    E0201,
    /// Required token missing (inserted by recovery)
    E0202,
    /// Unexpected end of input
    E0203,
    /// Input the parser could not recover from
    E0204,
    /// Nesting deeper than the configured limit
    E0205,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0204 => "E0204",
            Self::E0205 => "E0205",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        if self.is_lexical() { "lexical error" } else { "syntax error" }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "unrecognized character",
            Self::E0102 => "unterminated string",
            Self::E0103 => "unterminated block comment",
            Self::E0201 => "unexpected token",
            Self::E0202 => "missing token",
            Self::E0203 => "unexpected end of input",
            Self::E0204 => "unparsable input",
            Self::E0205 => "nesting too deep",
        }
    }

    /// Check if this error was raised by the lexer
    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::E0101 | Self::E0102 | Self::E0103)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
