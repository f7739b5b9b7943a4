//! Process-wide cache of compiled automatons, keyed by grammar fingerprint.
//!
//! Grammars that share a fingerprint share a bucket; a lookup only returns
//! an automaton compiled from an equal grammar.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{CompiledAutomaton, compile};
use crate::grammar::{Grammar, GrammarError};

#[derive(Debug, Default)]
pub struct AutomatonCache {
    automatons: RwLock<FxHashMap<u64, Vec<Arc<CompiledAutomaton>>>>,
}

impl AutomatonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached automaton for `grammar`, compiling it on first use.
    pub fn get_or_compile(&self, grammar: &Grammar) -> Result<Arc<CompiledAutomaton>, GrammarError> {
        let key = grammar.fingerprint();
        if let Some(automaton) = self.lookup(key, grammar) {
            return Ok(automaton);
        }
        // Compile outside the lock; a racing thread may insert first
        let compiled = Arc::new(compile(grammar)?);
        let mut automatons = self.automatons.write();
        let bucket = automatons.entry(key).or_default();
        if let Some(existing) = bucket.iter().find(|automaton| automaton.grammar() == grammar) {
            return Ok(Arc::clone(existing));
        }
        bucket.push(Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn get(&self, grammar: &Grammar) -> Option<Arc<CompiledAutomaton>> {
        self.lookup(grammar.fingerprint(), grammar)
    }

    pub fn invalidate(&self, grammar: &Grammar) -> bool {
        let key = grammar.fingerprint();
        let mut automatons = self.automatons.write();
        let Some(bucket) = automatons.get_mut(&key) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|automaton| automaton.grammar() != grammar);
        let removed = bucket.len() < before;
        if bucket.is_empty() {
            automatons.remove(&key);
        }
        removed
    }

    pub fn clear(&self) {
        self.automatons.write().clear();
    }

    pub fn len(&self) -> usize {
        self.automatons.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.automatons.read().is_empty()
    }

    fn lookup(&self, key: u64, grammar: &Grammar) -> Option<Arc<CompiledAutomaton>> {
        self.automatons
            .read()
            .get(&key)?
            .iter()
            .find(|automaton| automaton.grammar() == grammar)
            .cloned()
    }
}
