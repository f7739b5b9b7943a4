//! Incremental Re-parse Engine.
//!
//! A parse keeps the memo entries of its final run that only looked at
//! unrepaired tokens. After an edit the new text is tokenized and compared
//! with the old tokens: entries that looked only at the unchanged prefix are
//! reused as they are, entries that looked only at the unchanged suffix are
//! reused shifted to their new positions. Their green nodes are shared with
//! the old tree. Everything else is parsed again, so the result is the tree
//! a full parse of the new text would build.
//!
//! When reuse cannot be set up safely the edit is handled by a full parse.

mod edit;

use crate::lexer::{Lexed, tokenize};
use crate::parser::{Memo, MemoEntry, Parse, Parser, ReuseEntry, covers};

pub use edit::Edit;

impl Parser {
    /// Parse `new_text`, the result of applying `edit` to the text of `old`.
    pub fn reparse(&self, old: &Parse, edit: &Edit, new_text: &str) -> Parse {
        let lexed = tokenize(new_text, self.automaton());
        self.reparse_lexed(old, edit, new_text, lexed)
    }

    /// Like [`Parser::reparse`], with the new text already tokenized.
    pub fn reparse_tokens(&self, old: &Parse, edit: &Edit, new_text: &str, lexed: &Lexed) -> Parse {
        if !covers(new_text, lexed) {
            return self.reparse(old, edit, new_text);
        }
        self.reparse_lexed(old, edit, new_text, lexed.clone())
    }

    fn reparse_lexed(&self, old: &Parse, edit: &Edit, new_text: &str, lexed: Lexed) -> Parse {
        let seed = if !self.automaton().same_grammar(old.automaton()) {
            tracing::debug!("previous parse used another grammar; parsing from scratch");
            Memo::default()
        } else {
            match reusable(old, edit, new_text, &lexed) {
                Ok(seed) => seed,
                Err(reason) => {
                    tracing::debug!(reason, "parsing from scratch");
                    Memo::default()
                }
            }
        };
        self.parse_lexed(new_text, lexed, seed)
    }
}

/// Memo entries of `old` that are valid for the new token stream.
fn reusable(old: &Parse, edit: &Edit, new_text: &str, new: &Lexed) -> Result<Memo, &'static str> {
    let old_lexed = old.lexed();
    let old_len = u64::from(u32::from(old_lexed.text_len()));
    let removed = u64::from(u32::from(edit.old_end - edit.start));
    let inserted = u64::from(u32::from(edit.new_end - edit.start));
    if edit.start > edit.old_end
        || edit.start > edit.new_end
        || edit.old_end > old_lexed.text_len()
        || old_len - removed + inserted != new_text.len() as u64
    {
        return Err("edit does not match the texts");
    }

    let old_tokens = old_lexed.tokens();
    let new_tokens = new.tokens();
    let prefix = old_tokens
        .iter()
        .zip(new_tokens)
        .take_while(|(old, new)| {
            old.range.end() <= edit.start && old.range == new.range && old.kind == new.kind && old.error == new.error
        })
        .count();
    let delta = edit.delta();
    let max_suffix = old_tokens.len().min(new_tokens.len()) - prefix;
    let suffix = old_tokens
        .iter()
        .rev()
        .zip(new_tokens.iter().rev())
        .take(max_suffix)
        .take_while(|(old, new)| {
            old.range.start() >= edit.old_end
                && new.range.start() >= edit.new_end
                && i64::from(u32::from(new.range.start())) - i64::from(u32::from(old.range.start())) == delta
                && old.range.len() == new.range.len()
                && old.kind == new.kind
                && old.error == new.error
        })
        .count();
    if prefix == 0 && suffix == 0 {
        return Err("edit damages every token");
    }

    let old_layout = Layout::new(old_lexed);
    let new_layout = Layout::new(new);
    let prefix_end = old_layout.significant_before(prefix);
    let tail = old_layout
        .tail_in(old_tokens.len() - suffix)
        .min(new_layout.tail_in(new_tokens.len() - suffix));
    let old_suffix = old_layout.len() + 1 - tail;
    let shift = new_layout.len() as isize - old_layout.len() as isize;

    let mut memo = Memo::default();
    for ReuseEntry { key, entry } in old.reuse.iter() {
        let (rule, pos, min) = *key;
        if entry.lookahead <= prefix_end {
            memo.insert(*key, entry.clone());
        } else if pos >= old_suffix {
            memo.insert((rule, moved(pos, shift), min), shifted(entry, shift));
        }
    }
    tracing::debug!(
        prefix_tokens = prefix,
        suffix_tokens = suffix,
        reusable = old.reuse.len(),
        seeded = memo.len(),
        "reparse"
    );
    Ok(memo)
}

/// Positions of significant tokens within all tokens.
struct Layout {
    significant: Vec<usize>,
}

impl Layout {
    fn new(lexed: &Lexed) -> Self {
        let significant = lexed
            .tokens()
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.is_extra)
            .map(|(index, _)| index)
            .collect();
        Self { significant }
    }

    fn len(&self) -> usize {
        self.significant.len()
    }

    /// Significant tokens among the first `count` tokens.
    fn significant_before(&self, count: usize) -> usize {
        self.significant.partition_point(|&index| index < count)
    }

    /// How many significant positions, end of input included, have their
    /// leading trivia and token entirely at or after token `from`.
    fn tail_in(&self, from: usize) -> usize {
        let mut count = 0;
        // End of input: trivia after the last significant token
        for position in (0..=self.len()).rev() {
            let trivia_start = match position {
                0 => 0,
                _ => self.significant[position - 1] + 1,
            };
            if trivia_start < from {
                break;
            }
            count += 1;
        }
        count
    }
}

fn moved(pos: usize, shift: isize) -> usize {
    pos.saturating_add_signed(shift)
}

fn shifted(entry: &MemoEntry, shift: isize) -> MemoEntry {
    let mut entry = entry.clone();
    if let Some((_, end)) = entry.result.as_mut() {
        *end = moved(*end, shift);
    }
    if !entry.failure.is_none() {
        entry.failure.pos = moved(entry.failure.pos, shift);
    }
    entry.lookahead = moved(entry.lookahead, shift);
    entry
}
