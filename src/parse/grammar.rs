//! Grammar for the restricted dialect of C++ type and function syntax that
//! appears in compiler diagnostics.
//!
//! No AST is materialized: running a composed parser only confirms a span.
//! The grammar targets the two dominant diagnostic dialects, signatures
//! with an explicit parameter list and optional `[with ...]` substitution
//! clause and specialized-instantiation messages that end directly in an
//! angle-bracket group, and lets everything else fail gracefully.

use serde::Serialize;
use std::ops::Range;

use super::combinators::{alternative, multiple, optional, sequential, ParserFn};
use super::cursor::Cursor;
use crate::classify::{self, is_symbol_char, AtomicRegions};

/// Exact text, no surrounding whitespace requirement.
fn lit(s: &'static str) -> ParserFn {
    Box::new(move |cur| {
        if cur.starts_with(s) {
            cur.advance(s.len());
            true
        } else {
            false
        }
    })
}

/// Exact word bounded by a non-symbol character, consuming only the word.
fn word(s: &'static str) -> ParserFn {
    Box::new(move |cur| {
        if !cur.starts_with(s) {
            return false;
        }
        let start = cur.pos();
        cur.advance(s.len());
        if cur.peek().is_some_and(is_symbol_char) {
            cur.rewind(start);
            return false;
        }
        true
    })
}

/// Mandatory whitespace.
pub fn whitespace() -> ParserFn {
    Box::new(|cur| {
        let mut advanced = false;
        while matches!(cur.peek(), Some(' ') | Some('\t')) {
            cur.advance(1);
            advanced = true;
        }
        advanced
    })
}

/// Exact keyword followed by mandatory trailing whitespace, both consumed.
pub fn keyword(kw: &'static str) -> ParserFn {
    let ws = whitespace();
    Box::new(move |cur| {
        let start = cur.pos();
        if !cur.starts_with(kw) {
            return false;
        }
        cur.advance(kw.len());
        if !ws(cur) {
            cur.rewind(start);
            return false;
        }
        true
    })
}

/// One maximal symbol run, using the classifier's balanced-group-aware move
/// (qualified names, operator spellings, lambda descriptors).
pub fn symbol() -> ParserFn {
    Box::new(|cur| {
        match classify::symbol_extent(cur.text(), cur.atoms(), cur.pos(), cur.end()) {
            Some(end) => {
                cur.set_pos(end);
                true
            }
            None => false,
        }
    })
}

/// A balanced group introduced by `open`, consumed through its closer.
pub fn group(open: char) -> ParserFn {
    Box::new(move |cur| {
        if cur.peek() != Some(open) {
            return false;
        }
        // an opener inside an atomic region belongs to a symbol run
        if cur.atoms().region_at(cur.pos()).is_some() {
            return false;
        }
        match classify::matching_close(cur.text(), cur.atoms(), cur.pos(), cur.end()) {
            Some(close) => {
                cur.set_pos(close + 1);
                true
            }
            None => false,
        }
    })
}

/// Leading type qualifiers: cv-qualifiers plus the sign/width and
/// elaborated-type keywords GCC prints in instantiation messages.
fn qualifier() -> ParserFn {
    alternative(vec![
        keyword("const"),
        keyword("volatile"),
        keyword("unsigned"),
        keyword("signed"),
        keyword("short"),
        keyword("long"),
        keyword("struct"),
        keyword("class"),
        keyword("union"),
        keyword("enum"),
        keyword("typename"),
    ])
}

fn ref_modifier() -> ParserFn {
    alternative(vec![lit("&&"), lit("&"), lit("*")])
}

fn decltype_expr() -> ParserFn {
    sequential(vec![
        optional(keyword("constexpr")),
        lit("decltype"),
        optional(whitespace()),
        group('('),
    ])
}

/// `type := decltype_expr | [qual]* symbol [group'<' [symbol]] [ws ref]`
///
/// The trailing symbol picks up members named after a template group, e.g.
/// the `::value_type` of `std::vector<int>::value_type` when the angle group
/// was not already absorbed into the symbol run.
pub fn type_expr() -> ParserFn {
    alternative(vec![
        decltype_expr(),
        sequential(vec![
            optional(multiple(qualifier())),
            symbol(),
            optional(sequential(vec![group('<'), optional(symbol())])),
            optional(sequential(vec![whitespace(), ref_modifier()])),
        ]),
    ])
}

/// Trailing member-function qualifier: `const`, `volatile`, `&&` or `&`.
fn memfn_qual() -> ParserFn {
    alternative(vec![word("const"), word("volatile"), lit("&&"), lit("&")])
}

/// One balanced `[with ...]` substitution clause, not decomposed further.
fn with_clause() -> ParserFn {
    let bracket = group('[');
    Box::new(move |cur| {
        if !cur.starts_with("[with") {
            return false;
        }
        bracket(cur)
    })
}

fn template_preamble() -> ParserFn {
    sequential(vec![
        lit("template"),
        optional(whitespace()),
        group('<'),
        optional(whitespace()),
    ])
}

/// Function name: qualified names and operator spellings reuse the symbol
/// move, which keeps `A<T>::foo` together while leaving a trailing angle
/// group for the specialization dialect.
fn func_name() -> ParserFn {
    sequential(vec![optional(multiple(qualifier())), symbol()])
}

fn signature_tail() -> ParserFn {
    sequential(vec![
        func_name(),
        alternative(vec![
            sequential(vec![
                group('('),
                optional(whitespace()),
                optional(memfn_qual()),
                optional(sequential(vec![optional(whitespace()), with_clause()])),
            ]),
            group('<'),
        ]),
    ])
}

/// `function := [template_preamble] ['constexpr'] ['static']
///              ( type ws sig_tail | sig_tail )`
///
/// The return type is optional because constructors have none; the
/// distinguishing signal is whether the name is followed by an opening
/// parenthesis or by whitespace, which plain backtracking resolves.
pub fn function_expr() -> ParserFn {
    sequential(vec![
        optional(template_preamble()),
        optional(keyword("constexpr")),
        optional(keyword("static")),
        alternative(vec![
            sequential(vec![type_expr(), whitespace(), signature_tail()]),
            signature_tail(),
        ]),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Function,
    Type,
}

/// A confirmed span: no tree is retained, just the extent and which
/// top-level production recognized it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMatch {
    pub start: usize,
    pub end: usize,
    pub kind: MatchKind,
}

/// Attempt to recognize `range` as a function signature, then as a type.
///
/// A match covering the whole span always wins, function first. When both
/// productions only recognize a prefix, the longer prefix is kept (function
/// first on ties) and the caller reports the discrepancy.
pub fn match_expression(
    text: &str,
    atoms: &AtomicRegions,
    range: Range<usize>,
) -> Option<GrammarMatch> {
    let attempt = |parser: ParserFn, kind: MatchKind| -> Option<GrammarMatch> {
        let mut cur = Cursor::new(text, atoms, range.clone());
        if parser(&mut cur) {
            Some(GrammarMatch {
                start: range.start,
                end: cur.pos(),
                kind,
            })
        } else {
            debug_assert_eq!(cur.pos(), range.start, "failed parse must not consume");
            None
        }
    };

    let function = attempt(function_expr(), MatchKind::Function);
    if let Some(m) = &function {
        if m.end == range.end {
            return function;
        }
    }
    let typ = attempt(type_expr(), MatchKind::Type);
    if let Some(m) = &typ {
        if m.end == range.end {
            return typ;
        }
    }
    match (function, typ) {
        (Some(f), Some(t)) if t.end > f.end => Some(t),
        (Some(f), _) => Some(f),
        (None, t) => t,
    }
}
