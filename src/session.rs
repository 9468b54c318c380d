//! Diagnostic line coordination.
//!
//! A session owns the state of one compiler run: the configured fill width
//! and indent unit, the monotonically advancing cursor over the streamed
//! diagnostic text, and the formatted expressions produced so far. Lines are
//! processed only once complete (newline-terminated); a partial final line
//! waits for the next call. One unparsable expression never blocks the rest
//! of its line or subsequent lines.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

use crate::classify::AtomicRegions;
use crate::fold::{self, DepthRegion, Fold};
use crate::parse::{self, MatchKind};
use crate::printer::{self, FormatInstruction};

pub const DEFAULT_FILL_WIDTH: usize = 78;
pub const DEFAULT_INDENT_UNIT: usize = 2;

// The GCC/Clang error-line shapes: a file:line[:column]: prefix, or the
// template-instantiation context lines that carry the deeply nested spew.
static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s:][^:\n]*:\d+(?::\d+)?:\s|required from|In instantiation of|In substitution of")
        .expect("diagnostic line pattern")
});

// Static assertion failures are explicitly out of scope: too structurally
// different to usefully reformat.
static STATIC_ASSERT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"static_assert|static assertion").expect("static assert pattern"));

// A character literal embedded in a quoted expression, e.g. the 'x' of
// integral_constant<char, 'x'>. Checked only where a literal can start.
static CHAR_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^'(?:[^'\\]|\\.)'").expect("char literal pattern"));

/// Per-session configuration, threaded explicitly so multiple sessions can
/// run independently without cross-talk.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target maximum column count for a reformatted expression.
    pub fill_width: usize,
    /// Columns added per nesting level on a forced break.
    pub indent_unit: usize,
    /// Shape of a formatting-candidate line, per compiler family.
    pub line_pattern: Regex,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            fill_width: DEFAULT_FILL_WIDTH,
            indent_unit: DEFAULT_INDENT_UNIT,
            line_pattern: LINE_PATTERN.clone(),
        }
    }
}

/// One formatted quoted expression, with its fold metadata. All offsets are
/// absolute positions in the diagnostic stream.
#[derive(Debug, Clone, Serialize)]
pub struct ExprRecord {
    /// The span the grammar confirmed.
    pub span: Range<usize>,
    /// The full quoted span the expression was extracted from.
    pub quoted: Range<usize>,
    pub kind: MatchKind,
    pub instructions: Vec<FormatInstruction>,
    pub regions: Vec<DepthRegion>,
    pub folds: Vec<Fold>,
}

/// Non-fatal diagnostics about a quoted expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Note {
    /// Neither the function nor the type grammar recognized the expression.
    Unrecognized { span: Range<usize> },
    /// The grammar matched a prefix shorter than the whole quoted span,
    /// usually an unanticipated compiler-output variant.
    Partial { span: Range<usize>, matched_end: usize },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Unrecognized { span } => {
                write!(f, "unrecognized expression at {}..{}", span.start, span.end)
            }
            Note::Partial { span, matched_end } => write!(
                f,
                "expression at {}..{} only matched through {}",
                span.start, span.end, matched_end
            ),
        }
    }
}

/// Outcome of one qualifying diagnostic line.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    pub span: Range<usize>,
    /// Indices into the session's expression records.
    pub expressions: Vec<usize>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A fold was requested at a position not inside any formatted
    /// expression. No state is mutated.
    OutsideExpression { pos: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::OutsideExpression { pos } => {
                write!(f, "position {} is not inside a formatted expression", pos)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// One diagnostic session over a streamed compiler run.
pub struct Session {
    config: SessionConfig,
    consumed: usize,
    records: Vec<ExprRecord>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            config,
            consumed: 0,
            records: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// All expressions formatted so far this session.
    pub fn records(&self) -> &[ExprRecord] {
        &self.records
    }

    /// How far into the stream processing has advanced.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Start over for a new compiler run. Previously computed instructions
    /// are positional snapshots; a changed fill width also requires a reset
    /// and a re-feed, never incremental patching.
    pub fn reset(&mut self) {
        self.consumed = 0;
        self.records.clear();
    }

    /// Process every newly completed line of the stream. `buffer` is the
    /// whole diagnostic text received so far; the session remembers how far
    /// it already got and never re-processes a line. A partial final line is
    /// deferred until its newline arrives.
    pub fn process(&mut self, buffer: &str) -> Vec<LineReport> {
        assert!(
            buffer.len() >= self.consumed,
            "diagnostic stream must only grow within a session"
        );
        let mut reports = Vec::new();
        while let Some(nl) = buffer[self.consumed..].find('\n') {
            let span = self.consumed..self.consumed + nl;
            self.consumed = span.end + 1;
            if let Some(report) = self.process_line(buffer, span) {
                reports.push(report);
            }
        }
        reports
    }

    fn process_line(&mut self, buffer: &str, span: Range<usize>) -> Option<LineReport> {
        let line = &buffer[span.clone()];
        if !self.config.line_pattern.is_match(line) {
            return None;
        }
        if STATIC_ASSERT.is_match(line) {
            return None;
        }
        if line.chars().count() < self.config.fill_width {
            return None;
        }

        let atoms = AtomicRegions::find_in(buffer, span.clone());
        let mut expressions = Vec::new();
        let mut notes = Vec::new();
        for quoted in quoted_spans(line) {
            let quoted = span.start + quoted.start..span.start + quoted.end;
            match parse::match_expression(buffer, &atoms, quoted.clone()) {
                None => notes.push(Note::Unrecognized {
                    span: quoted.clone(),
                }),
                Some(m) => {
                    if m.end < quoted.end {
                        notes.push(Note::Partial {
                            span: quoted.clone(),
                            matched_end: m.end,
                        });
                    }
                    let matched = m.start..m.end;
                    let instructions = printer::format_span(
                        buffer,
                        &atoms,
                        matched.clone(),
                        0,
                        self.config.fill_width,
                        self.config.indent_unit,
                    );
                    let regions = fold::depth_regions(buffer, &atoms, matched.clone());
                    let folds = fold::fold_to(&regions, None);
                    expressions.push(self.records.len());
                    self.records.push(ExprRecord {
                        span: matched,
                        quoted,
                        kind: m.kind,
                        instructions,
                        regions,
                        folds,
                    });
                }
            }
        }
        Some(LineReport {
            span,
            expressions,
            notes,
        })
    }

    /// Fold the expression enclosing `pos` to `level`, or unfold it when
    /// `level` is absent. Returns the updated region state.
    pub fn fold_at(&mut self, pos: usize, level: Option<usize>) -> Result<&[Fold], SessionError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.quoted.contains(&pos))
            .ok_or(SessionError::OutsideExpression { pos })?;
        record.folds = fold::fold_to(&record.regions, level);
        Ok(&record.folds)
    }
}

/// Quoted candidate expressions within a line, delimited by a smart-quote
/// pair or plain apostrophes; embedded character literals are skipped.
/// Returned ranges are the quote contents, relative to the line.
fn quoted_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < line.len() {
        let c = match line[pos..].chars().next() {
            Some(c) => c,
            None => break,
        };
        if c == '\u{2018}' {
            let content = pos + c.len_utf8();
            match line[content..].find('\u{2019}') {
                Some(off) => {
                    spans.push(content..content + off);
                    pos = content + off + '\u{2019}'.len_utf8();
                }
                None => break,
            }
        } else if c == '\'' {
            let content = pos + 1;
            match plain_quote_close(line, content) {
                Some(close) => {
                    spans.push(content..close);
                    pos = close + 1;
                }
                None => break,
            }
        } else {
            pos += c.len_utf8();
        }
    }
    spans
}

/// Find the closing apostrophe from `from`, treating a `'x'` triple at a
/// position where a literal can appear (after a space, comma, opener or
/// equals sign) as content rather than a delimiter.
fn plain_quote_close(line: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < line.len() {
        let c = line[pos..].chars().next()?;
        if c == '\'' {
            let prev = line[from..pos].chars().last();
            let literal_position = matches!(prev, Some(' ' | ',' | '<' | '(' | '{' | '='));
            if literal_position {
                if let Some(m) = CHAR_LITERAL.find(&line[pos..]) {
                    pos += m.end();
                    continue;
                }
            }
            return Some(pos);
        }
        pos += c.len_utf8();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_text(line: &str) -> Vec<&str> {
        quoted_spans(line)
            .into_iter()
            .map(|r| &line[r])
            .collect()
    }

    #[test]
    fn smart_quotes_are_extracted() {
        assert_eq!(
            spans_text("error: no match for \u{2018}int\u{2019} and \u{2018}bool\u{2019}"),
            vec!["int", "bool"]
        );
    }

    #[test]
    fn plain_quotes_are_extracted() {
        assert_eq!(
            spans_text("candidate: 'void foo(int)' ignored"),
            vec!["void foo(int)"]
        );
    }

    #[test]
    fn embedded_char_literal_is_not_a_delimiter() {
        assert_eq!(
            spans_text("in 'integral_constant<char, 'x'>' here"),
            vec!["integral_constant<char, 'x'>"]
        );
    }

    #[test]
    fn escaped_char_literal_is_not_a_delimiter() {
        assert_eq!(
            spans_text("in 'integral_constant<char, '\\n'>' here"),
            vec!["integral_constant<char, '\\n'>"]
        );
    }

    #[test]
    fn static_assert_lines_are_skipped() {
        let mut session = Session::new(SessionConfig {
            fill_width: 10,
            ..Default::default()
        });
        let line = "foo.cc:3:9: error: static_assert failed for \u{2018}std::vector<int, std::allocator<int>>\u{2019}\n";
        let reports = session.process(line);
        assert!(reports.is_empty());
        assert!(session.records().is_empty());
    }

    #[test]
    fn short_lines_are_skipped() {
        let mut session = Session::new(SessionConfig::default());
        let reports = session.process("foo.cc:3:9: error: \u{2018}int\u{2019} bad\n");
        assert!(reports.is_empty());
    }

    #[test]
    fn non_diagnostic_lines_are_skipped() {
        let mut session = Session::new(SessionConfig {
            fill_width: 5,
            ..Default::default()
        });
        let reports = session.process("In file included from \u{2018}std::vector<int>\u{2019}\n");
        assert!(reports.is_empty());
    }

    #[test]
    fn partial_line_is_deferred_until_newline() {
        let mut session = Session::new(SessionConfig {
            fill_width: 20,
            ..Default::default()
        });
        let full = "foo.cc:3:9: error: no match for \u{2018}std::vector<int, std::allocator<int>>\u{2019}\n";
        let cut = full.len() - 10;
        assert!(session.process(&full[..cut]).is_empty());
        let reports = session.process(full);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].expressions.len(), 1);
        assert_eq!(session.consumed(), full.len());
    }

    #[test]
    fn unrecognized_expression_is_reported_not_fatal() {
        let mut session = Session::new(SessionConfig {
            fill_width: 20,
            ..Default::default()
        });
        let line = "foo.cc:3:9: error: \u{2018}(\u{2019} against \u{2018}std::vector<int, std::allocator<int>>\u{2019}\n";
        let reports = session.process(line);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].notes.len(), 1);
        assert!(matches!(reports[0].notes[0], Note::Unrecognized { .. }));
        // the second expression still formats
        assert_eq!(reports[0].expressions.len(), 1);
    }

    #[test]
    fn fold_outside_any_expression_is_an_error() {
        let mut session = Session::new(SessionConfig::default());
        assert_eq!(
            session.fold_at(0, Some(1)),
            Err(SessionError::OutsideExpression { pos: 0 })
        );
    }
}
