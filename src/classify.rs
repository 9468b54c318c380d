//! Lexical classification of diagnostic text.
//!
//! This module assigns a character class to each maximal run of a diagnostic
//! span, producing the token stream consumed by the printer and the depth
//! tracker. The pipeline consists of:
//! 1. Raw tokenization using a logos lexer (character-class runs only)
//! 2. An atomic-region pre-pass marking operator-overload spellings, lambda
//!    descriptors, and anonymous-class labels, whose delimiter characters
//!    must read as symbol constituents
//! 3. An assembly pass merging raw runs into classified token spans
//!
//! Keeping the logos pass vanilla and pushing all context-sensitive merging
//! into the assembly pass isolates the fiddly rules (punctuation absorbing
//! trailing whitespace, `> >` closers, balanced-group-aware symbol runs) in
//! one place.

use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Raw character-class runs produced by the logos pass.
///
/// Every character of the input matches exactly one rule, so the lexer never
/// produces an error for newline-free diagnostic spans.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
pub enum RawToken {
    #[regex(r"[,;]+")]
    Punct,

    #[regex(r"[ \t\r\n\f]+")]
    Space,

    #[regex(r"[(<\[{]")]
    Open,

    #[regex(r"[)>\]}]")]
    Close,

    // Catch-all for symbol-constituent runs
    #[regex(r"[^ \t\r\n\f,;()<>\[\]{}]+")]
    Word,
}

/// Final classification of a token span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Punct,
    Open,
    Close,
    Space,
    Symbol,
}

/// A classified span of diagnostic text. Offsets are byte positions into the
/// immutable source; spans are contiguous and non-overlapping per scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
    pub class: TokenClass,
}

// Spellings that contain delimiter characters but must read as single
// symbols: overloaded operator names, GCC and Clang lambda descriptors,
// anonymous-class labels, and the arrow of trailing return types.
static ATOMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\boperator\s*(?:\(\)|\[\]|<<=?|>>=?|<=>|->\*?|\+\+|--|&&|\|\||[-+*/%^&|~!=<>]=|[-+*/%^&|~!=<>]|,)",
        r"|<lambda\([^;]*?\)>",
        r"|\(lambda at [^)]*\)",
        r"|\(anonymous namespace\)",
        r"|\{anonymous\}",
        r"|->",
    ))
    .expect("atomic region pattern")
});

/// Pre-computed atomic regions for one piece of diagnostic text. All ranges
/// are byte offsets into the text the regions were computed from.
#[derive(Debug, Clone, Default)]
pub struct AtomicRegions {
    regions: Vec<Range<usize>>,
}

impl AtomicRegions {
    /// Mark atomic regions over the whole text.
    pub fn find(text: &str) -> Self {
        Self::find_in(text, 0..text.len())
    }

    /// Mark atomic regions within `range`, returning absolute offsets.
    pub fn find_in(text: &str, range: Range<usize>) -> Self {
        let regions = ATOMIC
            .find_iter(&text[range.clone()])
            .map(|m| range.start + m.start()..range.start + m.end())
            .collect();
        AtomicRegions { regions }
    }

    /// The region containing `pos`, if any.
    pub fn region_at(&self, pos: usize) -> Option<&Range<usize>> {
        // find_iter yields non-overlapping matches in ascending order
        let idx = self.regions.partition_point(|r| r.end <= pos);
        self.regions
            .get(idx)
            .filter(|r| r.start <= pos && pos < r.end)
    }

    /// True if a region starts exactly at `pos`.
    pub fn region_starts_at(&self, pos: usize) -> bool {
        self.region_at(pos).is_some_and(|r| r.start == pos)
    }
}

/// Symbol constituents are everything that is not whitespace, list
/// punctuation, or a group delimiter.
pub fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ',' | ';' | '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}')
}

fn is_open_char(c: char) -> bool {
    matches!(c, '(' | '<' | '[' | '{')
}

fn is_close_char(c: char) -> bool {
    matches!(c, ')' | '>' | ']' | '}')
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '<' => '>',
        '[' => ']',
        _ => '}',
    }
}

fn char_at(text: &str, pos: usize) -> Option<char> {
    text[pos..].chars().next()
}

/// Find the matching closer for the opener at `open`, scanning no further
/// than `limit`. Atomic regions are skipped wholesale so delimiter characters
/// inside `operator<<` or a lambda descriptor never unbalance the scan.
/// Returns the byte offset of the matching closer.
pub fn matching_close(
    text: &str,
    atoms: &AtomicRegions,
    open: usize,
    limit: usize,
) -> Option<usize> {
    let first = char_at(text, open)?;
    if !is_open_char(first) {
        return None;
    }
    let mut stack = vec![closer_for(first)];
    let mut pos = open + first.len_utf8();
    while pos < limit {
        if let Some(region) = atoms.region_at(pos) {
            if region.end > limit {
                return None;
            }
            pos = region.end;
            continue;
        }
        let c = char_at(text, pos)?;
        if is_open_char(c) {
            stack.push(closer_for(c));
        } else if is_close_char(c) {
            if stack.last() != Some(&c) {
                return None;
            }
            stack.pop();
            if stack.is_empty() {
                return Some(pos);
            }
        }
        pos += c.len_utf8();
    }
    None
}

/// The balanced-group-aware forward move over a symbol run.
///
/// A symbol run extends through atomic regions, and absorbs a fully balanced
/// nested group when another symbol constituent immediately follows the
/// group's closer (so `std::vector<T>::iterator` is a single symbol, while a
/// trailing `<...>` with nothing attached after it is left to be classified
/// as an open-group token). Returns the end of the run, or `None` when no
/// symbol starts at `start`.
pub fn symbol_extent(
    text: &str,
    atoms: &AtomicRegions,
    start: usize,
    limit: usize,
) -> Option<usize> {
    let mut pos = start;
    while pos < limit {
        if let Some(region) = atoms.region_at(pos) {
            if region.end > limit {
                break;
            }
            pos = region.end;
            continue;
        }
        let c = match char_at(text, pos) {
            Some(c) => c,
            None => break,
        };
        if is_symbol_char(c) {
            pos += c.len_utf8();
            continue;
        }
        if is_open_char(c) && pos > start {
            if let Some(close) = matching_close(text, atoms, pos, limit) {
                let after = close + 1;
                let continues = after < limit
                    && (atoms.region_starts_at(after)
                        || char_at(text, after).is_some_and(is_symbol_char));
                if continues {
                    pos = after;
                    continue;
                }
            }
        }
        break;
    }
    if pos > start {
        Some(pos)
    } else {
        None
    }
}

fn raw_tokens(text: &str, range: Range<usize>) -> Vec<(RawToken, Range<usize>)> {
    RawToken::lexer(&text[range.clone()])
        .spanned()
        .map(|(res, span)| {
            let token = res.unwrap_or(RawToken::Word);
            (token, range.start + span.start..range.start + span.end)
        })
        .collect()
}

/// Classify `range` of `text` into contiguous token spans.
pub fn scan(text: &str, atoms: &AtomicRegions, range: Range<usize>) -> Vec<TokenSpan> {
    let raws = raw_tokens(text, range.clone());
    let mut out = Vec::new();
    let mut i = 0;
    while i < raws.len() {
        let (token, span) = (raws[i].0, raws[i].1.clone());
        match token {
            RawToken::Punct => {
                // a punctuation run absorbs one trailing whitespace run
                let mut end = span.end;
                if let Some((RawToken::Space, next)) = raws.get(i + 1).map(|r| (r.0, r.1.clone()))
                {
                    end = next.end;
                    i += 1;
                }
                out.push(TokenSpan {
                    start: span.start,
                    end,
                    class: TokenClass::Punct,
                });
                i += 1;
            }
            RawToken::Space => {
                out.push(TokenSpan {
                    start: span.start,
                    end: span.end,
                    class: TokenClass::Space,
                });
                i += 1;
            }
            RawToken::Open if !atoms.region_starts_at(span.start) => {
                out.push(TokenSpan {
                    start: span.start,
                    end: span.end,
                    class: TokenClass::Open,
                });
                i += 1;
            }
            RawToken::Close => {
                // whitespace between two closers rides along with the first
                let mut end = span.end;
                if let (Some((RawToken::Space, ws)), Some((RawToken::Close, _))) = (
                    raws.get(i + 1).map(|r| (r.0, r.1.clone())),
                    raws.get(i + 2).map(|r| (r.0, r.1.clone())),
                ) {
                    end = ws.end;
                    i += 1;
                }
                out.push(TokenSpan {
                    start: span.start,
                    end,
                    class: TokenClass::Close,
                });
                i += 1;
            }
            _ => {
                // Word, or a delimiter opening an atomic region
                let end = symbol_extent(text, atoms, span.start, range.end).unwrap_or(span.end);
                while i < raws.len() && raws[i].1.start < end {
                    i += 1;
                }
                out.push(TokenSpan {
                    start: span.start,
                    end,
                    class: TokenClass::Symbol,
                });
            }
        }
    }
    out
}
