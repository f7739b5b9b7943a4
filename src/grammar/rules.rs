//! The `Grammar` container: named rules plus grammar-wide metadata.

use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use smol_str::SmolStr;

use super::error::GrammarError;
use super::expr::RuleExpr;

/// Characters that end scanning when found between two tokens.
pub const DEFAULT_END_MARKERS: [char; 2] = ['\0', '\u{1A}'];

/// A complete grammar, assembled as data.
///
/// Rule insertion order is significant: it is the declaration order used to
/// break ties between tokens and listed first in diagnostics.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: SmolStr,
    rules: IndexMap<SmolStr, RuleExpr>,
    start: Option<SmolStr>,
    extras: IndexSet<SmolStr>,
    hidden: IndexSet<SmolStr>,
    word: Option<SmolStr>,
    sync: IndexSet<SmolStr>,
    conflicts: Vec<Vec<SmolStr>>,
    end_markers: Vec<char>,
}

// Index collections compare as maps and sets; grammars also compare order.
impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.rules.iter().eq(other.rules.iter())
            && self.start == other.start
            && self.extras.iter().eq(other.extras.iter())
            && self.hidden.iter().eq(other.hidden.iter())
            && self.word == other.word
            && self.sync.iter().eq(other.sync.iter())
            && self.conflicts == other.conflicts
            && self.end_markers == other.end_markers
    }
}

impl Eq for Grammar {}

impl Default for Grammar {
    fn default() -> Self {
        Self::new("grammar")
    }
}

impl Grammar {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            rules: IndexMap::new(),
            start: None,
            extras: IndexSet::new(),
            hidden: IndexSet::new(),
            word: None,
            sync: IndexSet::new(),
            conflicts: Vec::new(),
            end_markers: DEFAULT_END_MARKERS.to_vec(),
        }
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Register a new rule. Fails if the name is already taken.
    pub fn define(&mut self, name: impl Into<SmolStr>, expr: RuleExpr) -> Result<&mut Self, GrammarError> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(GrammarError::DuplicateRule(name));
        }
        self.rules.insert(name, expr);
        Ok(self)
    }

    /// Register or overwrite a rule. An overwritten rule keeps its position.
    pub fn replace(&mut self, name: impl Into<SmolStr>, expr: RuleExpr) -> Option<RuleExpr> {
        self.rules.insert(name.into(), expr)
    }

    /// A lazy link to a rule, resolved when the grammar is compiled.
    pub fn reference(&self, name: impl Into<SmolStr>) -> RuleExpr {
        RuleExpr::Reference(name.into())
    }

    /// Inline the rule into its parents in the output tree.
    pub fn mark_hidden(&mut self, name: impl Into<SmolStr>) -> &mut Self {
        self.hidden.insert(name.into());
        self
    }

    /// Allow the token rule to appear between any two tokens.
    pub fn mark_extra(&mut self, name: impl Into<SmolStr>) -> &mut Self {
        self.extras.insert(name.into());
        self
    }

    pub fn set_start(&mut self, name: impl Into<SmolStr>) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    /// The identifier token used for keyword extraction.
    pub fn set_word(&mut self, name: impl Into<SmolStr>) -> &mut Self {
        self.word = Some(name.into());
        self
    }

    /// A literal at which error recovery may resume.
    pub fn add_sync(&mut self, literal: impl Into<SmolStr>) -> &mut Self {
        self.sync.insert(literal.into());
        self
    }

    /// Declare rules whose ambiguity is intended and resolved by declaration order.
    pub fn add_conflict<I, S>(&mut self, rules: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.conflicts.push(rules.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_end_markers(&mut self, markers: impl IntoIterator<Item = char>) -> &mut Self {
        self.end_markers = markers.into_iter().collect();
        self
    }

    pub fn set_name(&mut self, name: impl Into<SmolStr>) -> &mut Self {
        self.name = name.into();
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self, name: &str) -> Option<&RuleExpr> {
        self.rules.get(name)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = (&SmolStr, &RuleExpr)> {
        self.rules.iter()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn start(&self) -> Option<&SmolStr> {
        self.start.as_ref()
    }

    pub fn extras(&self) -> impl Iterator<Item = &SmolStr> {
        self.extras.iter()
    }

    pub fn word(&self) -> Option<&SmolStr> {
        self.word.as_ref()
    }

    pub fn sync_tokens(&self) -> impl Iterator<Item = &SmolStr> {
        self.sync.iter()
    }

    pub fn conflicts(&self) -> &[Vec<SmolStr>] {
        &self.conflicts
    }

    pub fn end_markers(&self) -> &[char] {
        &self.end_markers
    }

    pub fn explicitly_hidden(&self) -> impl Iterator<Item = &SmolStr> {
        self.hidden.iter()
    }

    /// Hidden rules: marked explicitly or named with a leading underscore.
    pub fn is_hidden(&self, name: &str) -> bool {
        name.starts_with('_') || self.hidden.contains(name)
    }

    pub fn is_extra(&self, name: &str) -> bool {
        self.extras.contains(name)
    }

    /// Whether `name` appears in a declared conflict set.
    pub fn in_declared_conflict(&self, name: &str) -> bool {
        self.conflicts
            .iter()
            .any(|set| set.iter().any(|rule| rule == name))
    }

    /// Stable hash of the grammar content, used to key compiled automatons.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.name.hash(&mut hasher);
        for (name, expr) in &self.rules {
            name.hash(&mut hasher);
            expr.hash(&mut hasher);
        }
        self.start.hash(&mut hasher);
        for extra in &self.extras {
            extra.hash(&mut hasher);
        }
        for hidden in &self.hidden {
            hidden.hash(&mut hasher);
        }
        self.word.hash(&mut hasher);
        for sync in &self.sync {
            sync.hash(&mut hasher);
        }
        self.conflicts.hash(&mut hasher);
        self.end_markers.hash(&mut hasher);
        hasher.finish()
    }
}
