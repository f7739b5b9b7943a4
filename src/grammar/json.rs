//! Loader for the `grammar.json` shape emitted by tree-sitter.
//!
//! `FIELD` and `ALIAS` wrappers are transparent: their content is used and
//! their names are dropped. Anonymous extras become hidden token rules.
//! A `CHOICE` whose last member is `BLANK` is read as `Optional`.

use serde::Deserialize;
use serde::de::IgnoredAny;
use smol_str::SmolStr;

use super::expr::{self, RuleExpr};
use super::{Grammar, GrammarError};

#[derive(Debug, Deserialize)]
struct JsonGrammar {
    name: String,
    #[serde(default)]
    word: Option<String>,
    rules: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    extras: Vec<JsonRule>,
    #[serde(default)]
    conflicts: Vec<Vec<String>>,
    #[serde(default)]
    inline: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum JsonRule {
    String { value: String },
    Pattern { value: String },
    Symbol { name: String },
    Seq { members: Vec<JsonRule> },
    Choice { members: Vec<JsonRule> },
    Repeat { content: Box<JsonRule> },
    Repeat1 { content: Box<JsonRule> },
    Blank,
    Token { content: Box<JsonRule> },
    ImmediateToken { content: Box<JsonRule> },
    Prec { value: PrecValue, content: Box<JsonRule> },
    PrecLeft { value: PrecValue, content: Box<JsonRule> },
    PrecRight { value: PrecValue, content: Box<JsonRule> },
    PrecDynamic { content: Box<JsonRule> },
    Field { content: Box<JsonRule> },
    Alias { content: Box<JsonRule> },
}

/// Precedence is an integer or a named level; named levels map to 0.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PrecValue {
    Level(i32),
    Named(IgnoredAny),
}

impl PrecValue {
    fn level(&self) -> i32 {
        match self {
            Self::Level(level) => *level,
            Self::Named(_) => 0,
        }
    }
}

/// Parse a tree-sitter `grammar.json` document into a `Grammar`.
pub fn parse_json(input: &str) -> Result<Grammar, GrammarError> {
    let json: JsonGrammar =
        serde_json::from_str(input).map_err(|err| GrammarError::Json(err.to_string()))?;

    let mut grammar = Grammar::new(json.name.as_str());
    for (name, value) in json.rules {
        let rule: JsonRule = serde_json::from_value(value)
            .map_err(|err| GrammarError::Json(format!("rule `{}`: {}", name, err)))?;
        grammar.define(name.as_str(), convert(rule))?;
    }
    let first = grammar.rules().next().map(|(name, _)| name.clone());
    if let Some(first) = first {
        grammar.set_start(first);
    }
    if let Some(word) = json.word {
        grammar.set_word(word.as_str());
    }

    for (index, extra) in json.extras.into_iter().enumerate() {
        match extra {
            JsonRule::Symbol { name } => {
                grammar.mark_extra(name.as_str());
            }
            other => {
                let name = SmolStr::new(format!("_extra_{}", index));
                grammar.define(name.clone(), convert(other))?;
                grammar.mark_extra(name);
            }
        }
    }
    for set in json.conflicts {
        grammar.add_conflict(set.iter().map(String::as_str));
    }
    for name in json.inline {
        grammar.mark_hidden(name.as_str());
    }
    Ok(grammar)
}

fn convert(rule: JsonRule) -> RuleExpr {
    match rule {
        JsonRule::String { value } => expr::literal(value.as_str()),
        JsonRule::Pattern { value } => expr::pattern(value.as_str()),
        JsonRule::Symbol { name } => expr::reference(name.as_str()),
        JsonRule::Seq { members } => expr::seq(members.into_iter().map(convert)),
        JsonRule::Choice { mut members } => {
            let optional = members.len() > 1 && matches!(members.last(), Some(JsonRule::Blank));
            if optional {
                members.pop();
                let inner = if members.len() == 1 {
                    members.pop().map(convert).unwrap_or(RuleExpr::Blank)
                } else {
                    expr::choice(members.into_iter().map(convert))
                };
                expr::optional(inner)
            } else {
                expr::choice(members.into_iter().map(convert))
            }
        }
        JsonRule::Repeat { content } => expr::repeat(convert(*content)),
        JsonRule::Repeat1 { content } => expr::repeat1(convert(*content)),
        JsonRule::Blank => RuleExpr::Blank,
        JsonRule::Token { content } | JsonRule::ImmediateToken { content } => {
            expr::token(convert(*content))
        }
        JsonRule::Prec { value, content } => expr::prec(value.level(), convert(*content)),
        JsonRule::PrecLeft { value, content } => expr::prec_left(value.level(), convert(*content)),
        JsonRule::PrecRight { value, content } => {
            expr::prec_right(value.level(), convert(*content))
        }
        JsonRule::PrecDynamic { content } | JsonRule::Field { content } | JsonRule::Alias { content } => {
            convert(*content)
        }
    }
}
