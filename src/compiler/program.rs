//! Lowered rule bodies: an arena of ops addressed by index.
//!
//! Rule references become `RuleId`s and sub-expressions become `OpId`s, so the
//! program has no recursive object graph and can be shared between threads.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::kinds::{KindClass, KindTable, SyntaxKind};
use super::lexical::LexicalGrammar;
use super::token_set::TokenSet;
use crate::grammar::{Assoc, Grammar, GrammarError, RuleExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) u32);

impl OpId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Precedence bound meaning "any operator may follow".
pub const MIN_PREC: i32 = i32::MIN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Token(SyntaxKind),
    Seq(Vec<OpId>),
    /// Ordered choice: the first alternative that matches wins.
    Choice(Vec<OpId>),
    Repeat { inner: OpId, min: u8 },
    Optional(OpId),
    Blank,
    /// Invoke a rule. `min_prec` bounds the operators a left-recursive rule may apply.
    Call { rule: RuleId, min_prec: i32 },
}

/// Continuation of a directly left-recursive alternative, after the leading self reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tail {
    pub prec: i32,
    pub assoc: Assoc,
    pub op: OpId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleBody {
    Plain(OpId),
    /// `A -> A x | y` rewritten as "parse a base, then grow it with tails".
    LeftRecursive { base: OpId, tails: Vec<Tail> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: SmolStr,
    pub kind: SyntaxKind,
    pub hidden: bool,
    pub body: RuleBody,
}

impl Rule {
    pub fn is_left_recursive(&self) -> bool {
        matches!(self.body, RuleBody::LeftRecursive { .. })
    }

    /// The op whose FIRST set and nullability stand for the whole rule.
    pub fn entry(&self) -> OpId {
        match self.body {
            RuleBody::Plain(op) | RuleBody::LeftRecursive { base: op, .. } => op,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) ops: Vec<Op>,
    pub(crate) owners: Vec<RuleId>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) nullable: Vec<bool>,
    pub(crate) first: Vec<TokenSet>,
}

impl Program {
    pub fn op(&self, id: OpId) -> &Op {
        &self.ops[id.index()]
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (RuleId(index as u32), rule))
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.rules().find(|(_, rule)| rule.name == name).map(|(id, _)| id)
    }

    /// Rule that an op was lowered from.
    pub fn owner(&self, id: OpId) -> RuleId {
        self.owners[id.index()]
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn nullable(&self, id: OpId) -> bool {
        self.nullable[id.index()]
    }

    pub fn first(&self, id: OpId) -> &TokenSet {
        &self.first[id.index()]
    }

    pub fn rule_nullable(&self, id: RuleId) -> bool {
        self.nullable(self.rule(id).entry())
    }

    pub fn rule_first(&self, id: RuleId) -> &TokenSet {
        self.first(self.rule(id).entry())
    }

    /// Structural equality of two ops.
    pub fn same_shape(&self, a: OpId, b: OpId) -> bool {
        match (self.op(a), self.op(b)) {
            (Op::Seq(x), Op::Seq(y)) | (Op::Choice(x), Op::Choice(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(a, b)| self.same_shape(*a, *b))
            }
            (Op::Repeat { inner: x, min: m }, Op::Repeat { inner: y, min: n }) => {
                m == n && self.same_shape(*x, *y)
            }
            (Op::Optional(x), Op::Optional(y)) => self.same_shape(*x, *y),
            (left, right) => left == right,
        }
    }
}

// =============================================================================
// Lowering
// =============================================================================

/// Lower every syntactic rule, assigning rule kinds after the token kinds.
pub(crate) fn lower(
    grammar: &Grammar,
    token_rules: &FxHashSet<SmolStr>,
    lexical: &LexicalGrammar,
    kinds: &mut KindTable,
) -> Result<Program, GrammarError> {
    let start = grammar.start().cloned().unwrap_or_default();
    let mut rule_ids = FxHashMap::default();
    let mut rules = Vec::new();
    for (name, _) in grammar.rules() {
        if token_rules.contains(name) {
            continue;
        }
        let hidden = grammar.is_hidden(name) && *name != start;
        let kind = kinds.push(name.clone(), KindClass::Rule { hidden });
        rule_ids.insert(name.clone(), RuleId(rules.len() as u32));
        rules.push(Rule {
            name: name.clone(),
            kind,
            hidden,
            body: RuleBody::Plain(OpId(0)),
        });
    }

    let mut lowerer = Lowerer {
        lexical,
        rule_ids: &rule_ids,
        ops: Vec::new(),
        owners: Vec::new(),
        current: RuleId(0),
        current_name: SmolStr::default(),
    };
    for (name, expr) in grammar.rules() {
        let Some(&id) = rule_ids.get(name) else {
            continue;
        };
        lowerer.current = id;
        lowerer.current_name = name.clone();
        rules[id.index()].body = lowerer.lower_rule(expr)?;
    }

    let op_count = lowerer.ops.len();
    Ok(Program {
        ops: lowerer.ops,
        owners: lowerer.owners,
        rules,
        nullable: vec![false; op_count],
        first: vec![TokenSet::new(); op_count],
    })
}

struct Lowerer<'a> {
    lexical: &'a LexicalGrammar,
    rule_ids: &'a FxHashMap<SmolStr, RuleId>,
    ops: Vec<Op>,
    owners: Vec<RuleId>,
    current: RuleId,
    current_name: SmolStr,
}

impl Lowerer<'_> {
    fn push(&mut self, op: Op) -> OpId {
        let id = OpId(self.ops.len() as u32);
        self.ops.push(op);
        self.owners.push(self.current);
        id
    }

    fn lower_rule(&mut self, body: &RuleExpr) -> Result<RuleBody, GrammarError> {
        let mut alternatives = Vec::new();
        flatten_alternatives(body, 0, Assoc::None, &mut alternatives);
        if !alternatives.iter().any(|alt| self.is_direct_tail(alt.expr)) {
            return Ok(RuleBody::Plain(self.lower(body)?));
        }

        let mut base = Vec::new();
        let mut tails = Vec::new();
        for alt in alternatives {
            let min = trailing_min(alt.level, alt.assoc);
            if self.is_direct_tail(alt.expr) {
                let rest: &[RuleExpr] = match alt.expr {
                    RuleExpr::Seq(items) => &items[1..],
                    _ => &[],
                };
                let op = self.lower_sequence(rest, min)?;
                tails.push(Tail {
                    prec: alt.level,
                    assoc: alt.assoc,
                    op,
                });
            } else {
                let op = match alt.expr {
                    RuleExpr::Seq(items) => self.lower_sequence(items, min)?,
                    other => self.lower(other)?,
                };
                base.push(op);
            }
        }
        if base.is_empty() {
            return Err(GrammarError::LeftRecursion {
                cycle: vec![self.current_name.clone(), self.current_name.clone()],
            });
        }
        let base = match base.as_slice() {
            [single] => *single,
            _ => self.push(Op::Choice(base)),
        };
        Ok(RuleBody::LeftRecursive { base, tails })
    }

    fn is_direct_tail(&self, expr: &RuleExpr) -> bool {
        let leading = match expr {
            RuleExpr::Seq(items) => items.first(),
            other => Some(other),
        };
        matches!(
            leading.map(RuleExpr::unwrap_prec),
            Some(RuleExpr::Reference(name)) if *name == self.current_name
        )
    }

    /// A sequence whose trailing self reference is bounded by `min`.
    fn lower_sequence(&mut self, items: &[RuleExpr], min: i32) -> Result<OpId, GrammarError> {
        let mut ops = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let op = match item.unwrap_prec() {
                RuleExpr::Reference(name) if index + 1 == items.len() && *name == self.current_name => {
                    self.push(Op::Call {
                        rule: self.current,
                        min_prec: min,
                    })
                }
                _ => self.lower(item)?,
            };
            ops.push(op);
        }
        Ok(match ops.as_slice() {
            [] => self.push(Op::Blank),
            [single] => *single,
            _ => self.push(Op::Seq(ops)),
        })
    }

    fn lower(&mut self, expr: &RuleExpr) -> Result<OpId, GrammarError> {
        let op = match expr {
            RuleExpr::Literal(text) => Op::Token(self.lexical.literal(text).ok_or_else(|| {
                GrammarError::InvalidToken {
                    rule: self.current_name.clone(),
                    reason: format!("literal {:?} has no token", text.as_str()),
                }
            })?),
            RuleExpr::Reference(name) => match self.rule_ids.get(name) {
                Some(&rule) => Op::Call {
                    rule,
                    min_prec: MIN_PREC,
                },
                None => Op::Token(
                    self.lexical
                        .named_token(name)
                        .ok_or_else(|| GrammarError::unresolved(self.current_name.clone(), name.clone()))?,
                ),
            },
            RuleExpr::Seq(items) => {
                let items = items
                    .iter()
                    .map(|item| self.lower(item))
                    .collect::<Result<Vec<_>, _>>()?;
                if items.is_empty() { Op::Blank } else { Op::Seq(items) }
            }
            RuleExpr::Choice(items) => Op::Choice(
                items
                    .iter()
                    .map(|item| self.lower(item))
                    .collect::<Result<_, _>>()?,
            ),
            RuleExpr::Repeat { inner, min } => Op::Repeat {
                inner: self.lower(inner)?,
                min: *min,
            },
            RuleExpr::Optional(inner) => Op::Optional(self.lower(inner)?),
            RuleExpr::Blank => Op::Blank,
            RuleExpr::Prec { inner, .. } => return self.lower(inner),
            leaf => Op::Token(self.lexical.inline_token(leaf).ok_or_else(|| {
                GrammarError::InvalidToken {
                    rule: self.current_name.clone(),
                    reason: "inline terminal has no token".into(),
                }
            })?),
        };
        Ok(self.push(op))
    }
}

struct Alternative<'e> {
    expr: &'e RuleExpr,
    level: i32,
    assoc: Assoc,
}

/// Top-level alternatives of a rule, with the precedence that applies to each.
fn flatten_alternatives<'e>(expr: &'e RuleExpr, level: i32, assoc: Assoc, out: &mut Vec<Alternative<'e>>) {
    match expr {
        RuleExpr::Prec { level, assoc, inner } => flatten_alternatives(inner, *level, *assoc, out),
        RuleExpr::Choice(items) => {
            for item in items {
                flatten_alternatives(item, level, assoc, out);
            }
        }
        other => out.push(Alternative {
            expr: other,
            level,
            assoc,
        }),
    }
}

/// Bound for the trailing operand: left-associative operators bind it one level tighter.
fn trailing_min(level: i32, assoc: Assoc) -> i32 {
    match assoc {
        Assoc::Left => level.saturating_add(1),
        Assoc::Right | Assoc::None => level,
    }
}
