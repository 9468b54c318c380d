//! # despew
//!
//! Recognizes C++ type names and function signatures embedded in compiler
//! diagnostic text (the deeply nested "template spew" some compilers
//! produce) and computes line-break and indentation instructions so nested
//! template instantiations fit a target column width, plus nesting-depth
//! metadata for collapse/expand folding.
//!
//! The crate never rewrites the diagnostic text: everything it produces is
//! a decoration overlay of ordered `(offset, indent)` instructions and
//! hide/placeholder regions for a presentation layer to apply. The
//! `despew` binary ships a reference renderer for plain-text use.

pub mod classify;
pub mod fold;
pub mod parse;
pub mod printer;
pub mod session;

pub use fold::{fold_to, DepthRegion, Fold};
pub use parse::{match_expression, GrammarMatch, MatchKind};
pub use printer::{format_span, render, FormatInstruction};
pub use session::{ExprRecord, LineReport, Note, Session, SessionConfig, SessionError};
