//! Lexical grammar: which rules are tokens, and how each token is matched.
//!
//! A rule is a *named token* when its body is a lexical leaf (`Pattern`,
//! `Token`, `Nested`, `Delimited`, `Quoted`), or a choice of lexical leaves
//! and other token rules. Extras and the word rule may also be plain
//! literals. Literals written inside syntactic rules become anonymous tokens
//! named by their text; other lexical leaves written inline become hidden
//! tokens.

use regex::Regex;
use regex_automata::meta;
use regex_automata::{Anchored, Input, MatchKind};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::kinds::{KindClass, KindTable, SyntaxKind};
use super::token_set::TokenSet;
use crate::grammar::{Grammar, GrammarError, RuleExpr};

/// How the lexer recognizes one token.
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(SmolStr),
    Regex(TokenRegex),
    Nested { open: SmolStr, close: SmolStr },
    Delimited { prefix: SmolStr, suffix: SmolStr },
    Quoted { open: SmolStr, close: SmolStr },
    /// Longest of several matchers.
    Any(Vec<Matcher>),
}

impl Matcher {
    pub fn is_literal(&self) -> bool {
        matches!(self, Matcher::Literal(_))
    }
}

/// A regex run anchored at the start of the remaining input, reporting the
/// longest match rather than the first alternative that matches.
#[derive(Debug, Clone)]
pub struct TokenRegex {
    regex: meta::Regex,
}

impl TokenRegex {
    fn new(source: &str) -> Result<Self, meta::BuildError> {
        let regex = meta::Regex::builder()
            .configure(meta::Regex::config().match_kind(MatchKind::All))
            .build(&format!("(?:{})", source))?;
        Ok(Self { regex })
    }

    /// Length of the longest match at the start of `text`.
    pub fn longest(&self, text: &str) -> Option<usize> {
        let input = Input::new(text).anchored(Anchored::Yes);
        self.regex.find(input).map(|found| found.end())
    }
}

/// One terminal of the grammar.
#[derive(Debug, Clone)]
pub struct TokenDef {
    pub kind: SyntaxKind,
    pub name: SmolStr,
    pub matcher: Matcher,
    pub is_extra: bool,
    /// A word-like literal that the word token also matches exactly.
    pub is_keyword: bool,
}

/// All terminals, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct LexicalGrammar {
    pub tokens: Vec<TokenDef>,
    pub word: Option<SyntaxKind>,
    pub keywords: FxHashMap<SmolStr, SyntaxKind>,
    pub extras: TokenSet,
    pub end_markers: Vec<char>,
    pub(crate) named: FxHashMap<SmolStr, SyntaxKind>,
    pub(crate) literals: FxHashMap<SmolStr, SyntaxKind>,
    pub(crate) inline: FxHashMap<RuleExpr, SyntaxKind>,
}

impl LexicalGrammar {
    pub fn token(&self, kind: SyntaxKind) -> Option<&TokenDef> {
        self.tokens.iter().find(|def| def.kind == kind)
    }

    pub fn is_extra(&self, kind: SyntaxKind) -> bool {
        kind == SyntaxKind::END_MARKER || self.extras.contains(kind)
    }

    /// Kind of a token rule, used from a syntactic rule.
    pub fn named_token(&self, name: &str) -> Option<SyntaxKind> {
        self.named.get(name).copied()
    }

    pub fn literal(&self, text: &str) -> Option<SyntaxKind> {
        self.literals.get(text).copied()
    }

    pub(crate) fn inline_token(&self, expr: &RuleExpr) -> Option<SyntaxKind> {
        self.inline.get(expr).copied()
    }
}

/// Rules that lex as tokens, as a least fixpoint so reference cycles stay syntactic.
pub(crate) fn token_rules(grammar: &Grammar) -> FxHashSet<SmolStr> {
    let forced: FxHashSet<&SmolStr> = grammar.extras().chain(grammar.word()).collect();
    let start = grammar.start();
    let mut tokens = FxHashSet::default();
    loop {
        let mut changed = false;
        for (name, body) in grammar.rules() {
            if tokens.contains(name) || Some(name) == start {
                continue;
            }
            let allow_literal = forced.contains(name);
            if is_lexical_body(body.unwrap_prec(), allow_literal, &tokens) {
                tokens.insert(name.clone());
                changed = true;
            }
        }
        if !changed {
            return tokens;
        }
    }
}

fn is_lexical_body(body: &RuleExpr, allow_literal: bool, tokens: &FxHashSet<SmolStr>) -> bool {
    let piece = |expr: &RuleExpr| match expr.unwrap_prec() {
        RuleExpr::Literal(_) => allow_literal,
        RuleExpr::Reference(name) => tokens.contains(name),
        other => other.is_lexical_leaf(),
    };
    match body {
        RuleExpr::Choice(alternatives) => alternatives.iter().all(piece),
        other => piece(other),
    }
}

/// Build the lexical grammar, assigning token kinds in declaration order.
pub(crate) fn build(
    grammar: &Grammar,
    token_rules: &FxHashSet<SmolStr>,
    kinds: &mut KindTable,
) -> Result<LexicalGrammar, GrammarError> {
    let mut lexical = LexicalGrammar {
        end_markers: grammar.end_markers().to_vec(),
        ..LexicalGrammar::default()
    };

    for extra in grammar.extras() {
        if !token_rules.contains(extra) {
            return Err(GrammarError::InvalidExtra {
                name: extra.clone(),
                reason: "extras must be tokens, but this rule has syntactic structure".into(),
            });
        }
    }
    if let Some(word) = grammar.word().filter(|word| !token_rules.contains(*word)) {
        return Err(GrammarError::InvalidWord {
            name: word.clone(),
            reason: "the word rule must be a token".into(),
        });
    }

    let used = used_token_rules(grammar, token_rules);
    for (name, body) in grammar.rules() {
        if !used.contains(name) {
            continue;
        }
        let matcher = rule_matcher(grammar, name, body.unwrap_prec())?;
        let hidden = grammar.is_hidden(name) || grammar.is_extra(name);
        let kind = kinds.push(name.clone(), KindClass::NamedToken { hidden });
        lexical.named.insert(name.clone(), kind);
        if grammar.is_extra(name) {
            lexical.extras.insert(kind);
        }
        lexical.tokens.push(TokenDef {
            kind,
            name: name.clone(),
            matcher,
            is_extra: grammar.is_extra(name),
            is_keyword: false,
        });
    }
    lexical.word = grammar.word().and_then(|word| lexical.named.get(word).copied());

    for (name, body) in grammar.rules() {
        if token_rules.contains(name) {
            continue;
        }
        collect_anonymous(grammar, name, body, kinds, &mut lexical)?;
    }

    extract_keywords(&mut lexical);
    Ok(lexical)
}

/// Token rules used as tokens: referenced from a syntactic rule, an extra, or the word.
fn used_token_rules(grammar: &Grammar, token_rules: &FxHashSet<SmolStr>) -> FxHashSet<SmolStr> {
    let mut used: FxHashSet<SmolStr> = grammar
        .extras()
        .chain(grammar.word())
        .filter(|name| token_rules.contains(*name))
        .cloned()
        .collect();
    for (name, body) in grammar.rules() {
        if token_rules.contains(name) {
            continue;
        }
        body.for_each_reference(&mut |reference| {
            if token_rules.contains(reference) {
                used.insert(reference.clone());
            }
        });
    }
    used
}

fn collect_anonymous(
    grammar: &Grammar,
    rule: &SmolStr,
    expr: &RuleExpr,
    kinds: &mut KindTable,
    lexical: &mut LexicalGrammar,
) -> Result<(), GrammarError> {
    match expr {
        RuleExpr::Literal(text) => {
            if text.is_empty() {
                return Err(GrammarError::InvalidToken {
                    rule: rule.clone(),
                    reason: "empty literal".into(),
                });
            }
            if !lexical.literals.contains_key(text) {
                let keyword = is_word_like(text);
                let kind = kinds.push(text.clone(), KindClass::Literal { keyword });
                lexical.literals.insert(text.clone(), kind);
                lexical.tokens.push(TokenDef {
                    kind,
                    name: text.clone(),
                    matcher: Matcher::Literal(text.clone()),
                    is_extra: false,
                    is_keyword: false,
                });
            }
        }
        leaf if leaf.is_lexical_leaf() => {
            if !lexical.inline.contains_key(leaf) {
                let matcher = rule_matcher(grammar, rule, leaf)?;
                let name = inline_name(leaf, rule);
                let kind = kinds.push(name.clone(), KindClass::NamedToken { hidden: true });
                lexical.inline.insert(leaf.clone(), kind);
                lexical.tokens.push(TokenDef {
                    kind,
                    name,
                    matcher,
                    is_extra: false,
                    is_keyword: false,
                });
            }
        }
        RuleExpr::Seq(items) | RuleExpr::Choice(items) => {
            for item in items {
                collect_anonymous(grammar, rule, item, kinds, lexical)?;
            }
        }
        RuleExpr::Repeat { inner, .. } | RuleExpr::Optional(inner) | RuleExpr::Prec { inner, .. } => {
            collect_anonymous(grammar, rule, inner, kinds, lexical)?;
        }
        _ => {}
    }
    Ok(())
}

fn inline_name(leaf: &RuleExpr, rule: &str) -> SmolStr {
    match leaf {
        RuleExpr::Pattern(pattern) => SmolStr::new(format!("/{}/", pattern)),
        RuleExpr::Nested { open, close } | RuleExpr::Quoted { open, close } => {
            SmolStr::new(format!("{}...{}", open, close))
        }
        RuleExpr::Delimited { prefix, suffix } => SmolStr::new(format!("{}...{}", prefix, suffix)),
        _ => SmolStr::new(format!("{}_token", rule)),
    }
}

/// Keyword literals are matched through the word token when it covers them.
fn extract_keywords(lexical: &mut LexicalGrammar) {
    let Some(word) = lexical.word else {
        return;
    };
    let Some(Matcher::Regex(word_regex)) = lexical.token(word).map(|def| def.matcher.clone()) else {
        return;
    };
    for def in &mut lexical.tokens {
        let Matcher::Literal(text) = &def.matcher else {
            continue;
        };
        if def.kind == word || def.is_extra || !is_word_like(text) {
            continue;
        }
        let covered = word_regex.longest(text) == Some(text.len());
        if covered {
            def.is_keyword = true;
            lexical.keywords.insert(text.clone(), def.kind);
        }
    }
}

/// An identifier per Unicode UAX #31, allowing a leading underscore.
pub fn is_word_like(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

// =============================================================================
// Matchers
// =============================================================================

fn rule_matcher(grammar: &Grammar, rule: &SmolStr, body: &RuleExpr) -> Result<Matcher, GrammarError> {
    let mut visiting = vec![rule.clone()];
    matcher_for(grammar, rule, body, &mut visiting)
}

fn matcher_for(
    grammar: &Grammar,
    rule: &SmolStr,
    body: &RuleExpr,
    visiting: &mut Vec<SmolStr>,
) -> Result<Matcher, GrammarError> {
    Ok(match body.unwrap_prec() {
        RuleExpr::Literal(text) => Matcher::Literal(text.clone()),
        RuleExpr::Nested { open, close } => {
            check_delimiters(rule, open, close)?;
            Matcher::Nested {
                open: open.clone(),
                close: close.clone(),
            }
        }
        RuleExpr::Quoted { open, close } => {
            check_delimiters(rule, open, close)?;
            Matcher::Quoted {
                open: open.clone(),
                close: close.clone(),
            }
        }
        RuleExpr::Delimited { prefix, suffix } => {
            check_delimiters(rule, prefix, suffix)?;
            Matcher::Delimited {
                prefix: prefix.clone(),
                suffix: suffix.clone(),
            }
        }
        RuleExpr::Choice(alternatives) => Matcher::Any(
            alternatives
                .iter()
                .map(|alternative| matcher_for(grammar, rule, alternative, visiting))
                .collect::<Result<_, _>>()?,
        ),
        RuleExpr::Reference(name) => {
            let target = referenced(grammar, rule, name, visiting)?;
            visiting.push(name.clone());
            let matcher = matcher_for(grammar, name, target, visiting);
            visiting.pop();
            matcher?
        }
        other => {
            let source = regex_source(grammar, rule, other, visiting)?;
            anchored(rule, &source)?
        }
    })
}

fn check_delimiters(rule: &SmolStr, open: &str, close: &str) -> Result<(), GrammarError> {
    if open.is_empty() || close.is_empty() {
        return Err(GrammarError::InvalidToken {
            rule: rule.clone(),
            reason: "delimiters must not be empty".into(),
        });
    }
    Ok(())
}

fn referenced<'g>(
    grammar: &'g Grammar,
    rule: &SmolStr,
    name: &SmolStr,
    visiting: &[SmolStr],
) -> Result<&'g RuleExpr, GrammarError> {
    if visiting.contains(name) {
        return Err(GrammarError::InvalidToken {
            rule: rule.clone(),
            reason: format!("token refers to itself through `{}`", name),
        });
    }
    grammar
        .rule(name)
        .ok_or_else(|| GrammarError::unresolved(rule.clone(), name.clone()))
}

fn anchored(rule: &SmolStr, source: &str) -> Result<Matcher, GrammarError> {
    // Patterns were validated one by one in `regex_source`
    TokenRegex::new(source)
        .map(Matcher::Regex)
        .map_err(|err| GrammarError::InvalidToken {
            rule: rule.clone(),
            reason: err.to_string(),
        })
}

/// Translate a lexical expression into regex syntax.
fn regex_source(
    grammar: &Grammar,
    rule: &SmolStr,
    expr: &RuleExpr,
    visiting: &mut Vec<SmolStr>,
) -> Result<String, GrammarError> {
    Ok(match expr {
        RuleExpr::Literal(text) => regex::escape(text),
        RuleExpr::Pattern(pattern) => {
            // Validate alone so the error names the pattern as written
            if let Err(source) = Regex::new(pattern) {
                return Err(GrammarError::InvalidPattern {
                    rule: rule.clone(),
                    pattern: pattern.clone(),
                    source,
                });
            }
            format!("(?:{})", pattern)
        }
        RuleExpr::Seq(items) => items
            .iter()
            .map(|item| regex_source(grammar, rule, item, visiting))
            .collect::<Result<Vec<_>, _>>()?
            .concat(),
        RuleExpr::Choice(items) => format!(
            "(?:{})",
            items
                .iter()
                .map(|item| regex_source(grammar, rule, item, visiting))
                .collect::<Result<Vec<_>, _>>()?
                .join("|")
        ),
        RuleExpr::Repeat { inner, min } => {
            let inner = regex_source(grammar, rule, inner, visiting)?;
            format!("(?:{}){}", inner, if *min == 0 { "*" } else { "+" })
        }
        RuleExpr::Optional(inner) => format!("(?:{})?", regex_source(grammar, rule, inner, visiting)?),
        RuleExpr::Blank => String::new(),
        RuleExpr::Token(inner) | RuleExpr::Prec { inner, .. } => {
            regex_source(grammar, rule, inner, visiting)?
        }
        RuleExpr::Reference(name) => {
            let target = referenced(grammar, rule, name, visiting)?;
            visiting.push(name.clone());
            let source = regex_source(grammar, name, target, visiting);
            visiting.pop();
            source?
        }
        RuleExpr::Nested { .. } | RuleExpr::Delimited { .. } | RuleExpr::Quoted { .. } => {
            return Err(GrammarError::InvalidToken {
                rule: rule.clone(),
                reason: "nested, delimited and quoted terminals cannot be combined inside token()"
                    .into(),
            });
        }
    })
}
