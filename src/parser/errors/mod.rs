//! Parse diagnostics
//!
//! Parse errors are data, not `Err` values: every parse returns a tree, and
//! the problems found on the way are listed next to it.
//! - Categorized error codes for filtering and documentation
//! - Expected-token sets and the recovery that was applied
//! - Hints and related locations

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{Recovery, RelatedInfo, Severity, SyntaxError, SyntaxErrorBuilder};
