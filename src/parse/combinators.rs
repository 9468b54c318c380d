//! Parser combinator primitives for the diagnostic grammar.
//!
//! A parser is a boxed function over the shared cursor returning success or
//! failure. The contract every combinator relies on: a failing parser leaves
//! the cursor at its pre-attempt position, so callers may always retry an
//! alternative construct from the same starting point.

use super::cursor::Cursor;

pub type ParserFn = Box<dyn Fn(&mut Cursor<'_>) -> bool>;

/// Succeeds iff every step succeeds in order. On any failure the cursor
/// rewinds to the pre-sequence position.
pub fn sequential(steps: Vec<ParserFn>) -> ParserFn {
    Box::new(move |cur| {
        let start = cur.pos();
        for step in &steps {
            if !step(cur) {
                cur.rewind(start);
                return false;
            }
        }
        true
    })
}

/// Tries each option in order, returning on the first success; fails only if
/// all options fail, with the cursor fully rewound.
pub fn alternative(options: Vec<ParserFn>) -> ParserFn {
    Box::new(move |cur| {
        let start = cur.pos();
        for option in &options {
            if option(cur) {
                return true;
            }
            cur.rewind(start);
        }
        false
    })
}

/// Always succeeds; consumes only if the inner parser succeeds.
pub fn optional(inner: ParserFn) -> ParserFn {
    Box::new(move |cur| {
        let start = cur.pos();
        if !inner(cur) {
            cur.rewind(start);
        }
        true
    })
}

/// Succeeds iff the inner parser succeeds at least once, then greedily
/// repeats until it fails, leaving the cursor at the last success.
pub fn multiple(inner: ParserFn) -> ParserFn {
    Box::new(move |cur| {
        if !inner(cur) {
            return false;
        }
        loop {
            let mark = cur.pos();
            if !inner(cur) {
                cur.rewind(mark);
                break;
            }
            // zero-width success would loop forever
            if cur.pos() == mark {
                break;
            }
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AtomicRegions;

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

    fn run(parser: &ParserFn, text: &str) -> (bool, usize) {
        let atoms = AtomicRegions::find(text);
        let mut cur = Cursor::new(text, &atoms, 0..text.len());
        let ok = parser(&mut cur);
        (ok, cur.pos())
    }

    #[test]
    fn sequential_rewinds_on_failure() {
        let p = sequential(vec![lit("ab"), lit("cd")]);
        assert_eq!(run(&p, "abxx"), (false, 0));
        assert_eq!(run(&p, "abcd"), (true, 4));
    }

    #[test]
    fn alternative_tries_in_order() {
        let p = alternative(vec![lit("aa"), lit("ab")]);
        assert_eq!(run(&p, "ab"), (true, 2));
        assert_eq!(run(&p, "zz"), (false, 0));
    }

    #[test]
    fn optional_never_fails() {
        let p = optional(lit("x"));
        assert_eq!(run(&p, "y"), (true, 0));
        assert_eq!(run(&p, "x"), (true, 1));
    }

    #[test]
    fn multiple_requires_one_and_is_greedy() {
        let p = multiple(lit("ab"));
        assert_eq!(run(&p, "zz"), (false, 0));
        assert_eq!(run(&p, "ababx"), (true, 4));
    }
}
