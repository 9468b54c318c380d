//! Backtracking recursive-descent recognition of diagnostic C++ syntax.
//!
//! `cursor` holds the shared backtracking cursor, `combinators` the generic
//! sequencing/alternation/repetition primitives, and `grammar` the concrete
//! productions for types, function signatures, template preambles and
//! `[with ...]` clauses.

pub mod combinators;
pub mod cursor;
pub mod grammar;

pub use cursor::Cursor;
pub use grammar::{match_expression, GrammarMatch, MatchKind};
