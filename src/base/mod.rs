//! Foundation types shared by every stage of the pipeline.
//!
//! - [`TextRange`], [`TextSize`] - byte offsets (re-exported from `text-size`)
//! - [`Position`], [`Span`] - 0-indexed line/column positions
//! - [`LineIndex`] - byte offset <-> line/column conversion
//!
//! This module has NO dependencies on other gramma modules.

mod line_index;
mod position;

pub use line_index::LineIndex;
pub use position::{Position, Span};
pub(crate) use position::break_len;

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
