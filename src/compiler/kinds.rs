//! Syntax kinds for the rowan-based CST
//!
//! Unlike a hand-written parser, kinds are not a fixed enum: the compiler
//! assigns them per grammar. A handful of reserved kinds come first, then
//! one kind per token (in declaration order), then one per syntactic rule.

use smol_str::SmolStr;

/// A node or token kind, assigned by the grammar compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
    /// Node wrapping skipped, unexpected input.
    pub const ERROR: SyntaxKind = SyntaxKind(0);
    /// Node wrapping a zero-width token inserted by error recovery.
    pub const MISSING: SyntaxKind = SyntaxKind(1);
    /// Token made of characters no terminal matches.
    pub const UNKNOWN: SyntaxKind = SyntaxKind(2);
    /// Token holding everything from an end-of-input marker (NUL, Ctrl-Z) on.
    pub const END_MARKER: SyntaxKind = SyntaxKind(3);
    /// End of input; appears in expected-token sets, never in trees.
    pub const EOF: SyntaxKind = SyntaxKind(4);

    pub(crate) const RESERVED: u16 = 5;

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_reserved(self) -> bool {
        self.0 < Self::RESERVED
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind.0)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        Self(raw.0)
    }
}

/// What a kind stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindClass {
    /// One of the reserved kinds.
    Reserved,
    /// A literal token, named by its text.
    Literal { keyword: bool },
    /// A token defined by a rule.
    NamedToken { hidden: bool },
    /// A syntactic rule.
    Rule { hidden: bool },
}

/// Name and class of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindInfo {
    pub name: SmolStr,
    pub class: KindClass,
}

impl KindInfo {
    pub fn is_token(&self) -> bool {
        matches!(
            self.class,
            KindClass::Literal { .. } | KindClass::NamedToken { .. }
        ) || matches!(self.name.as_str(), "UNKNOWN" | "END_MARKER")
    }

    /// Named kinds print as `(name)` in S-expressions, anonymous ones as text.
    pub fn is_named(&self) -> bool {
        match self.class {
            KindClass::Reserved => true,
            KindClass::Literal { .. } => false,
            KindClass::NamedToken { hidden } | KindClass::Rule { hidden } => !hidden,
        }
    }

    /// Human-readable form for diagnostics: literals are quoted.
    pub fn display(&self) -> String {
        match self.class {
            KindClass::Literal { .. } => format!("{:?}", self.name.as_str()),
            _ => self.name.to_string(),
        }
    }
}

/// Kind table, indexed by `SyntaxKind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTable {
    kinds: Vec<KindInfo>,
}

impl Default for KindTable {
    fn default() -> Self {
        let reserved = ["ERROR", "MISSING", "UNKNOWN", "END_MARKER", "EOF"];
        Self {
            kinds: reserved
                .iter()
                .map(|name| KindInfo {
                    name: SmolStr::new(name),
                    class: KindClass::Reserved,
                })
                .collect(),
        }
    }
}

impl KindTable {
    pub(crate) fn push(&mut self, name: SmolStr, class: KindClass) -> SyntaxKind {
        let kind = SyntaxKind(self.kinds.len() as u16);
        self.kinds.push(KindInfo { name, class });
        kind
    }

    pub fn get(&self, kind: SyntaxKind) -> Option<&KindInfo> {
        self.kinds.get(kind.index())
    }

    pub fn name(&self, kind: SyntaxKind) -> &str {
        self.get(kind).map(|info| info.name.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SyntaxKind, &KindInfo)> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(index, info)| (SyntaxKind(index as u16), info))
    }

    /// Look a kind up by name (rule name, token rule name or literal text).
    pub fn find(&self, name: &str) -> Option<SyntaxKind> {
        self.iter()
            .find(|(_, info)| info.name == name)
            .map(|(kind, _)| kind)
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrammarLanguage {}

impl rowan::Language for GrammarLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<GrammarLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<GrammarLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<GrammarLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<GrammarLanguage>;
