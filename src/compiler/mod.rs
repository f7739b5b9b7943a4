//! Grammar Compiler: turns a [`Grammar`] into an immutable [`CompiledAutomaton`].
//!
//! ## Phases
//!
//! 1. [`resolve`] - start rule, references and directives resolve; unreachable rules are reported
//! 2. [`lexical`] - token rules are classified, token kinds assigned, matchers built
//! 3. [`program`] - syntactic rules are lowered into an op arena; direct left recursion is
//!    rewritten into a base plus precedence-ranked tails
//! 4. [`analysis`] - nullable and FIRST sets
//! 5. [`left_recursion`] - any remaining left-corner cycle is rejected
//! 6. [`conflicts`] - shapes that ordered choice cannot disambiguate are rejected
//!
//! The engine is an ordered-choice (PEG) interpreter: alternatives are tried in
//! declaration order and the first that matches wins, so no ambiguity ever
//! reaches the caller.

mod analysis;
mod cache;
mod conflicts;
mod kinds;
mod left_recursion;
pub mod lexical;
pub mod program;
mod resolve;
mod token_set;

use std::fmt;

use smol_str::SmolStr;

use crate::grammar::{Grammar, GrammarError};

pub use cache::AutomatonCache;
pub use kinds::{
    GrammarLanguage, KindClass, KindInfo, KindTable, SyntaxElement, SyntaxKind, SyntaxNode,
    SyntaxNodeChildren, SyntaxToken,
};
pub use lexical::{LexicalGrammar, Matcher, TokenDef};
pub use program::{MIN_PREC, Op, OpId, Program, Rule, RuleBody, RuleId, Tail};
pub use token_set::TokenSet;

/// Non-fatal findings about a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileWarning {
    /// A rule no parse can ever reach.
    UnreachableRule(SmolStr),
    /// Two alternatives of one choice can start with the same token; the earlier one wins.
    OrderedAmbiguity {
        rule: SmolStr,
        first: usize,
        second: usize,
        tokens: Vec<SmolStr>,
    },
    /// A conflict inside a declared conflict set, resolved by declaration order.
    ToleratedConflict { rules: Vec<SmolStr>, reason: String },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreachableRule(rule) => write!(f, "rule `{}` is unreachable", rule),
            Self::OrderedAmbiguity {
                rule,
                first,
                second,
                tokens,
            } => write!(
                f,
                "alternatives {} and {} of `{}` both start with {}; alternative {} wins",
                first,
                second,
                rule,
                tokens.join(", "),
                first
            ),
            Self::ToleratedConflict { rules, reason } => {
                write!(f, "declared conflict in {}: {}", rules.join(", "), reason)
            }
        }
    }
}

/// The executable form of a grammar. Immutable and shareable across threads.
#[derive(Debug)]
pub struct CompiledAutomaton {
    name: SmolStr,
    fingerprint: u64,
    grammar: Grammar,
    kinds: KindTable,
    lexical: LexicalGrammar,
    program: Program,
    start: RuleId,
    sync: TokenSet,
    warnings: Vec<CompileWarning>,
}

/// Compile a grammar. Every failure is a grammar-definition error.
pub fn compile(grammar: &Grammar) -> Result<CompiledAutomaton, GrammarError> {
    let resolution = resolve::resolve(grammar)?;
    let token_rules = lexical::token_rules(grammar);

    let mut kinds = KindTable::default();
    let lexical = lexical::build(grammar, &token_rules, &mut kinds)?;
    let mut program = program::lower(grammar, &token_rules, &lexical, &mut kinds)?;
    analysis::compute(&mut program);
    left_recursion::check(&program)?;

    let mut warnings: Vec<CompileWarning> = resolution
        .unreachable
        .into_iter()
        .map(CompileWarning::UnreachableRule)
        .collect();
    warnings.extend(conflicts::check(grammar, &program, &kinds)?);

    let start = program
        .rule_id(&resolution.start)
        .ok_or_else(|| GrammarError::unresolved("start", resolution.start.clone()))?;

    let mut sync = TokenSet::new();
    for name in grammar.sync_tokens() {
        let kind = lexical
            .literal(name)
            .or_else(|| lexical.named_token(name))
            .ok_or_else(|| GrammarError::unresolved("sync", name.clone()))?;
        sync.insert(kind);
    }

    tracing::debug!(
        grammar = grammar.name(),
        tokens = lexical.tokens.len(),
        rules = program.rules.len(),
        ops = program.op_count(),
        warnings = warnings.len(),
        "compiled grammar"
    );

    Ok(CompiledAutomaton {
        name: SmolStr::new(grammar.name()),
        fingerprint: grammar.fingerprint(),
        grammar: grammar.clone(),
        kinds,
        lexical,
        program,
        start,
        sync,
        warnings,
    })
}

impl CompiledAutomaton {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fingerprint of the grammar this automaton was compiled from.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// The grammar this automaton was compiled from.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Compiled from a grammar equal to `grammar`. The fingerprint only
    /// rules grammars out; equal fingerprints are confirmed rule by rule.
    pub fn is_compiled_from(&self, grammar: &Grammar) -> bool {
        self.fingerprint == grammar.fingerprint() && self.grammar == *grammar
    }

    /// Compiled from an equal grammar, so kinds and rules line up.
    pub fn same_grammar(&self, other: &CompiledAutomaton) -> bool {
        std::ptr::eq(self, other) || (self.fingerprint == other.fingerprint && self.grammar == other.grammar)
    }

    pub fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    pub fn kind_info(&self, kind: SyntaxKind) -> Option<&KindInfo> {
        self.kinds.get(kind)
    }

    /// Rule name, token rule name, or quoted literal text.
    pub fn kind_name(&self, kind: SyntaxKind) -> String {
        self.kinds
            .get(kind)
            .map(KindInfo::display)
            .unwrap_or_else(|| format!("<kind {}>", kind.0))
    }

    /// Kind of a rule, token rule or literal, by name.
    pub fn kind(&self, name: &str) -> Option<SyntaxKind> {
        self.kinds.find(name)
    }

    pub fn lexical(&self) -> &LexicalGrammar {
        &self.lexical
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn start_rule(&self) -> RuleId {
        self.start
    }

    pub fn start_kind(&self) -> SyntaxKind {
        self.program.rule(self.start).kind
    }

    /// Tokens at which error recovery may resynchronize.
    pub fn sync_tokens(&self) -> &TokenSet {
        &self.sync
    }

    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    /// Extras and end-of-input markers: skipped by the parser, kept in the tree.
    pub fn is_trivia(&self, kind: SyntaxKind) -> bool {
        self.lexical.is_extra(kind)
    }
}
