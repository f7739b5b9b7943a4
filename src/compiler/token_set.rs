//! Bitset over syntax kinds, used for FIRST sets and expected tokens.

use super::kinds::SyntaxKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(kind: SyntaxKind) -> Self {
        let mut set = Self::new();
        set.insert(kind);
        set
    }

    /// Returns true if the kind was not yet present.
    pub fn insert(&mut self, kind: SyntaxKind) -> bool {
        let (word, bit) = (kind.index() / 64, kind.index() % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & (1 << bit) == 0;
        self.words[word] |= 1 << bit;
        fresh
    }

    pub fn contains(&self, kind: SyntaxKind) -> bool {
        let (word, bit) = (kind.index() / 64, kind.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Returns true if anything was added.
    pub fn union_with(&mut self, other: &TokenSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn intersects(&self, other: &TokenSet) -> bool {
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    pub fn intersection(&self, other: &TokenSet) -> TokenSet {
        TokenSet {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a & b).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Kinds in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        self.words.iter().enumerate().flat_map(|(index, word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| SyntaxKind((index * 64 + bit) as u16))
        })
    }
}

impl FromIterator<SyntaxKind> for TokenSet {
    fn from_iter<I: IntoIterator<Item = SyntaxKind>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}
