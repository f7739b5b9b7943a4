//! Parser options

/// Limits and switches for the parsing engine and error recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Memoize rule calls (packrat parsing). Also required for reuse by `reparse`.
    pub memoize: bool,
    /// Maximum depth of nested rule calls; deeper input is skipped as an error
    pub max_depth: usize,
    /// Maximum number of engine runs spent on error recovery for one input
    pub max_trials: usize,
    /// Maximum number of repairs (one per reported syntax error)
    pub max_repairs: usize,
    /// How many tokens (or sync tokens, when the grammar declares some) a skip may cover
    pub sync_window: usize,
    /// Maximum number of tokens inserted in front of one token
    pub max_insertions_per_position: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            memoize: true,
            max_depth: 4096,
            max_trials: 4096,
            max_repairs: 256,
            sync_window: 4,
            max_insertions_per_position: 4,
        }
    }
}

impl ParserConfig {
    /// Configuration without error recovery: the first error abandons the parse.
    pub fn strict() -> Self {
        Self {
            max_repairs: 0,
            ..Self::default()
        }
    }
}
