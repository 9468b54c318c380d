//! Backtracking cursor over immutable diagnostic text.
//!
//! All parsing operates purely on byte offsets; the source text is never
//! mutated. The cursor is bounded by the span under consideration so no
//! parser can read past the candidate expression.

use crate::classify::AtomicRegions;
use std::ops::Range;

pub struct Cursor<'t> {
    text: &'t str,
    atoms: &'t AtomicRegions,
    pos: usize,
    end: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(text: &'t str, atoms: &'t AtomicRegions, range: Range<usize>) -> Self {
        assert!(range.end <= text.len(), "cursor range exceeds text");
        Cursor {
            text,
            atoms,
            pos: range.start,
            end: range.end,
        }
    }

    pub fn text(&self) -> &'t str {
        self.text
    }

    pub fn atoms(&self) -> &'t AtomicRegions {
        self.atoms
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Rewind to an earlier position after a failed attempt.
    pub fn rewind(&mut self, pos: usize) {
        assert!(pos <= self.pos, "cursor must not rewind forward");
        self.pos = pos;
    }

    /// Move to `pos`, which must stay within the span.
    pub fn set_pos(&mut self, pos: usize) {
        assert!(pos <= self.end, "cursor moved past span end");
        self.pos = pos;
    }

    pub fn peek(&self) -> Option<char> {
        if self.at_end() {
            None
        } else {
            self.text[self.pos..self.end].chars().next()
        }
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text[self.pos..self.end].starts_with(prefix)
    }

    pub fn advance(&mut self, bytes: usize) {
        self.set_pos(self.pos + bytes);
    }
}
