//! Matchers run against the remaining input.
//!
//! Nested comments and delimited strings are scanned iteratively with an
//! explicit stack of open delimiters, so deeply nested input cannot overflow
//! the call stack. An unterminated construct consumes the rest of the input.

use smol_str::SmolStr;

use super::{Construct, LexError};
use crate::base::break_len;
use crate::compiler::Matcher;

/// Result of running one matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scan {
    pub len: usize,
    pub error: Option<LexError>,
}

impl Scan {
    fn ok(len: usize) -> Self {
        Self { len, error: None }
    }

    fn unterminated(rest: &str, construct: Construct, open: &str, close: &str) -> Self {
        Self {
            len: rest.len(),
            error: Some(LexError::Unterminated {
                construct,
                open: SmolStr::new(open),
                close: SmolStr::new(close),
            }),
        }
    }
}

/// Run `matcher` at the start of `rest`. Empty matches count as no match.
pub(crate) fn scan(matcher: &Matcher, rest: &str) -> Option<Scan> {
    let scan = match matcher {
        Matcher::Literal(text) => rest.starts_with(text.as_str()).then(|| Scan::ok(text.len())),
        Matcher::Regex(regex) => regex.longest(rest).map(Scan::ok),
        Matcher::Nested { open, close } => scan_nested(rest, open, close),
        Matcher::Quoted { open, close } => scan_quoted(rest, open, close),
        Matcher::Delimited { prefix, suffix } => scan_delimited(rest, prefix, suffix),
        Matcher::Any(matchers) => {
            let mut best: Option<Scan> = None;
            for scan in matchers.iter().filter_map(|matcher| scan(matcher, rest)) {
                if best.as_ref().is_none_or(|best| scan.len > best.len) {
                    best = Some(scan);
                }
            }
            best
        }
    }?;
    (scan.len > 0).then_some(scan)
}

fn char_len(rest: &str, at: usize) -> usize {
    rest[at..].chars().next().map_or(1, char::len_utf8)
}

/// `/+ a /+ b +/ c +/`: every `open` must be matched by a `close`.
fn scan_nested(rest: &str, open: &str, close: &str) -> Option<Scan> {
    if !rest.starts_with(open) {
        return None;
    }
    let mut opened = vec![0usize];
    let mut at = open.len();
    while let Some(&innermost) = opened.last() {
        if at >= rest.len() {
            tracing::trace!(depth = opened.len(), innermost, "unterminated nested block");
            return Some(Scan::unterminated(rest, Construct::NestedComment, open, close));
        }
        let tail = &rest[at..];
        if tail.starts_with(close) {
            opened.pop();
            at += close.len();
        } else if tail.starts_with(open) {
            opened.push(at);
            at += open.len();
        } else {
            at += char_len(rest, at);
        }
    }
    Some(Scan::ok(at))
}

/// `"a \" b"`: a backslash escapes the next character.
fn scan_quoted(rest: &str, open: &str, close: &str) -> Option<Scan> {
    if !rest.starts_with(open) {
        return None;
    }
    let mut at = open.len();
    loop {
        if at >= rest.len() {
            return Some(Scan::unterminated(rest, Construct::QuotedString, open, close));
        }
        let tail = &rest[at..];
        if tail.starts_with(close) {
            return Some(Scan::ok(at + close.len()));
        }
        if tail.starts_with('\\') {
            at += 1;
            if at < rest.len() {
                at += char_len(rest, at);
            }
        } else {
            at += char_len(rest, at);
        }
    }
}

fn closing_bracket(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}

/// `q"(..)"`, `q"[..]"`, `q"EOS\n..\nEOS"`, `q"/../"`: the delimiter follows the prefix.
fn scan_delimited(rest: &str, prefix: &str, suffix: &str) -> Option<Scan> {
    if !rest.starts_with(prefix) {
        return None;
    }
    let body = prefix.len();
    let Some(delimiter) = rest[body..].chars().next() else {
        return Some(Scan::unterminated(rest, Construct::DelimitedString, prefix, suffix));
    };
    let at = body + delimiter.len_utf8();

    if let Some(closer) = closing_bracket(delimiter) {
        return Some(scan_bracketed(rest, at, delimiter, closer, prefix, suffix));
    }
    if delimiter == '_' || unicode_ident::is_xid_start(delimiter) {
        return Some(scan_heredoc(rest, body, prefix, suffix));
    }

    // Any other character closes itself: q"/abc/"
    let mut at = at;
    while at < rest.len() {
        let tail = &rest[at..];
        if tail.starts_with(delimiter) && tail[delimiter.len_utf8()..].starts_with(suffix) {
            return Some(Scan::ok(at + delimiter.len_utf8() + suffix.len()));
        }
        at += char_len(rest, at);
    }
    Some(Scan::unterminated(rest, Construct::DelimitedString, prefix, suffix))
}

/// Brackets of the delimiter's own kind nest; the outermost closer must precede the suffix.
fn scan_bracketed(rest: &str, mut at: usize, open: char, close: char, prefix: &str, suffix: &str) -> Scan {
    let mut opened = vec![at - open.len_utf8()];
    while at < rest.len() {
        let tail = &rest[at..];
        if tail.starts_with(close) {
            at += close.len_utf8();
            opened.pop();
            if opened.is_empty() {
                if rest[at..].starts_with(suffix) {
                    return Scan::ok(at + suffix.len());
                }
                // A closer not followed by the suffix is content
                opened.push(at);
            }
        } else if tail.starts_with(open) {
            opened.push(at);
            at += open.len_utf8();
        } else {
            at += char_len(rest, at);
        }
    }
    Scan::unterminated(rest, Construct::DelimitedString, prefix, suffix)
}

/// `q"EOS` newline, content lines, then a line that is exactly `EOS` followed by the suffix.
fn scan_heredoc(rest: &str, body: usize, prefix: &str, suffix: &str) -> Scan {
    let ident_len = rest[body..]
        .char_indices()
        .find(|(_, c)| !(*c == '_' || unicode_ident::is_xid_continue(*c)))
        .map_or(rest.len() - body, |(index, _)| index);
    let ident = &rest[body..body + ident_len];
    let mut at = body + ident_len;
    let newline = if at < rest.len() { break_len(rest, at) } else { None };
    match newline {
        Some(len) => at += len,
        None => return Scan::unterminated(rest, Construct::DelimitedString, prefix, suffix),
    }
    while at < rest.len() {
        let line = &rest[at..];
        if line.starts_with(ident) && line[ident.len()..].starts_with(suffix) {
            return Scan::ok(at + ident.len() + suffix.len());
        }
        // Skip to the start of the next line
        let mut cursor = at;
        loop {
            if cursor >= rest.len() {
                return Scan::unterminated(rest, Construct::DelimitedString, prefix, suffix);
            }
            if let Some(len) = break_len(rest, cursor) {
                at = cursor + len;
                break;
            }
            cursor += char_len(rest, cursor);
        }
    }
    Scan::unterminated(rest, Construct::DelimitedString, prefix, suffix)
}
