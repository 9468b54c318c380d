//! Two-stage indentation/fill engine.
//!
//! The scanner re-tokenizes a confirmed matched span through the classifier
//! and feeds each token to the printer together with at most one structural
//! event. The printer maintains a stack of indentation frames and a
//! remaining-width budget, and emits position-anchored formatting
//! instructions; the source text itself is never rewritten. A single atomic
//! token wider than the fill width is never split: the engine only controls
//! breaking between tokens and groups.

use serde::Serialize;
use std::ops::Range;

use crate::classify::{self, AtomicRegions, TokenClass};

/// Directs insertion of a line break followed by `indent` spaces at
/// `offset` in the original text. A pure decoration overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatInstruction {
    pub offset: usize,
    pub indent: usize,
}

/// Structural events emitted by the scanner alongside the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// An opening group delimiter; `length` is the character count from just
    /// past the opener through the matching closer. This deliberately counts
    /// interior whitespace, a pessimistic over-estimate kept as-is because
    /// "correcting" it changes break decisions in unvalidated ways.
    Enter { length: usize },
    /// A closing group delimiter.
    Exit,
    /// An optional break point between sibling elements, after a
    /// comma/semicolon token.
    InternalBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    NoBreak,
    Break,
}

/// One nested grouping level. While a group is in `Break` mode, every
/// sibling element is placed on its own line at `indent`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    mode: Mode,
    indent: usize,
}

struct Printer {
    width: usize,
    indent_unit: usize,
    frames: Vec<Frame>,
    remaining: isize,
    insert_at: usize,
    instructions: Vec<FormatInstruction>,
}

impl Printer {
    fn new(width: usize, indent_unit: usize, initial_indent: usize, origin: usize) -> Self {
        Printer {
            width,
            indent_unit,
            frames: vec![Frame {
                mode: Mode::NoBreak,
                indent: initial_indent,
            }],
            remaining: width as isize - initial_indent as isize,
            insert_at: origin,
            instructions: Vec::new(),
        }
    }

    fn top(&self) -> Frame {
        *self.frames.last().expect("frame stack empty mid-print")
    }

    fn token(&mut self, len: usize, end: usize) {
        self.remaining -= len as isize;
        self.insert_at = end;
    }

    fn event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Enter { length } => {
                let top = self.top();
                if length == 1 || length as isize <= self.remaining {
                    self.frames.push(Frame {
                        mode: Mode::NoBreak,
                        indent: top.indent,
                    });
                } else {
                    let indent = top.indent + self.indent_unit;
                    self.remaining = self.width as isize - indent as isize;
                    self.instructions.push(FormatInstruction {
                        offset: self.insert_at,
                        indent,
                    });
                    self.frames.push(Frame {
                        mode: Mode::Break,
                        indent,
                    });
                }
            }
            ScanEvent::InternalBreak => {
                let top = self.top();
                if top.mode == Mode::Break {
                    self.instructions.push(FormatInstruction {
                        offset: self.insert_at,
                        indent: top.indent,
                    });
                    self.remaining = self.width as isize - top.indent as isize;
                }
            }
            ScanEvent::Exit => {
                self.frames.pop();
                assert!(!self.frames.is_empty(), "frame stack underflow on exit");
            }
        }
    }

    fn finish(self) -> Vec<FormatInstruction> {
        self.instructions
    }
}

/// Compute the ordered formatting instructions for a matched span.
///
/// `initial_indent` is supplied by the caller, e.g. derived from the width
/// of a label preceding the span.
pub fn format_span(
    text: &str,
    atoms: &AtomicRegions,
    range: Range<usize>,
    initial_indent: usize,
    width: usize,
    indent_unit: usize,
) -> Vec<FormatInstruction> {
    let tokens = classify::scan(text, atoms, range.clone());
    let mut printer = Printer::new(width, indent_unit, initial_indent, range.start);
    for tok in &tokens {
        let len = text[tok.start..tok.end].chars().count();
        printer.token(len, tok.end);
        match tok.class {
            TokenClass::Open => {
                let close = classify::matching_close(text, atoms, tok.start, range.end)
                    .expect("unbalanced group in matched span");
                let length = text[tok.end..close + 1].chars().count();
                printer.event(ScanEvent::Enter { length });
            }
            TokenClass::Close => printer.event(ScanEvent::Exit),
            TokenClass::Punct => printer.event(ScanEvent::InternalBreak),
            TokenClass::Space | TokenClass::Symbol => {}
        }
    }
    printer.finish()
}

/// Reference application of the decoration overlay: splice a newline plus
/// indentation at each instruction offset. Instructions must be ordered.
pub fn render(text: &str, instructions: &[FormatInstruction]) -> String {
    let mut out = String::with_capacity(text.len() + instructions.len() * 8);
    let mut prev = 0;
    for ins in instructions {
        assert!(ins.offset >= prev, "instructions out of order");
        out.push_str(&text[prev..ins.offset]);
        out.push('\n');
        for _ in 0..ins.indent {
            out.push(' ');
        }
        prev = ins.offset;
    }
    out.push_str(&text[prev..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(text: &str, width: usize, indent_unit: usize) -> Vec<FormatInstruction> {
        let atoms = AtomicRegions::find(text);
        format_span(text, &atoms, 0..text.len(), 0, width, indent_unit)
    }

    #[test]
    fn narrow_vector_breaks_per_element() {
        let text = "std::vector<int, std::allocator<int>>";
        let instructions = format(text, 20, 2);
        assert_eq!(
            instructions,
            vec![
                FormatInstruction {
                    offset: 12,
                    indent: 2
                },
                FormatInstruction {
                    offset: 17,
                    indent: 2
                },
                FormatInstruction {
                    offset: 32,
                    indent: 4
                },
            ]
        );
        assert_eq!(
            render(text, &instructions),
            "std::vector<\n  int, \n  std::allocator<\n    int>>"
        );
    }

    #[test]
    fn wide_span_needs_no_instructions() {
        let text = "std::vector<int, std::allocator<int>>";
        assert!(format(text, 100, 2).is_empty());
    }

    #[test]
    fn empty_group_never_breaks() {
        let text = "really::quite::a::long::name::here()";
        assert!(format(text, 10, 2).is_empty());
    }

    #[test]
    fn with_clause_breaks_per_substitution() {
        let text = "void foo(int, double) [with T = int; U = double]";
        let instructions = format(text, 30, 2);
        assert_eq!(
            instructions,
            vec![
                FormatInstruction {
                    offset: 23,
                    indent: 2
                },
                FormatInstruction {
                    offset: 37,
                    indent: 2
                },
            ]
        );
        assert_eq!(
            render(text, &instructions),
            "void foo(int, double) [\n  with T = int; \n  U = double]"
        );
    }

    #[test]
    fn round_trip_restores_original() {
        let text = "std::map<std::string, std::vector<std::pair<int, bool>>>";
        let instructions = format(text, 24, 2);
        assert!(!instructions.is_empty());
        let rendered = render(text, &instructions);
        let stripped: String = rendered
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.to_string()
                } else {
                    line.trim_start().to_string()
                }
            })
            .collect();
        assert_eq!(stripped, text);
    }

    #[test]
    fn initial_indent_reduces_budget() {
        let text = "pair<int, bool>";
        let atoms = AtomicRegions::find(text);
        // fits at indent 0, breaks when the label indent eats the budget
        assert!(format_span(text, &atoms, 0..text.len(), 0, 16, 2).is_empty());
        assert!(!format_span(text, &atoms, 0..text.len(), 8, 16, 2).is_empty());
    }
}
