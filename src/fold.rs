//! Nesting-depth computation and collapse/expand folding.
//!
//! Shares the classifier's token and grouping model with the printer: a
//! matched span is walked once, tracking open-group starts, and every
//! balanced group is recorded with its nesting depth. Folding marks regions
//! hidden from a requested depth down, with a placeholder on the regions at
//! exactly that depth.

use serde::Serialize;
use std::ops::Range;

use crate::classify::{self, AtomicRegions, TokenClass};

/// A balanced group's extent tagged with its nesting depth; `start` is just
/// past the opener, `end` at the closer. Depth 1 is the outermost group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepthRegion {
    pub start: usize,
    pub end: usize,
    pub depth: usize,
}

/// Visibility and placeholder state of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fold {
    pub region: DepthRegion,
    pub hidden: bool,
    pub placeholder: bool,
}

/// Compute the depth region of every balanced group within a matched span.
/// Groups absorbed into symbol runs (operator spellings, lambda descriptors,
/// interior groups of qualified names) are part of their symbol and carry no
/// region.
pub fn depth_regions(text: &str, atoms: &AtomicRegions, range: Range<usize>) -> Vec<DepthRegion> {
    let tokens = classify::scan(text, atoms, range);
    let mut stack: Vec<usize> = Vec::new();
    let mut regions = Vec::new();
    for tok in &tokens {
        match tok.class {
            TokenClass::Open => stack.push(tok.end),
            TokenClass::Close => {
                let start = stack.pop().expect("unbalanced close in matched span");
                regions.push(DepthRegion {
                    start,
                    end: tok.start,
                    depth: stack.len() + 1,
                });
            }
            _ => {}
        }
    }
    assert!(stack.is_empty(), "unclosed group in matched span");
    regions.sort_by_key(|r| (r.start, r.end));
    regions
}

/// Fold to `level`: every region at depth >= `level` is hidden, and regions
/// at exactly `level` carry the replacement placeholder. With no level, all
/// regions are visible and placeholders cleared.
pub fn fold_to(regions: &[DepthRegion], level: Option<usize>) -> Vec<Fold> {
    regions
        .iter()
        .map(|&region| match level {
            Some(level) => Fold {
                region,
                hidden: region.depth >= level,
                placeholder: region.depth == level,
            },
            None => Fold {
                region,
                hidden: false,
                placeholder: false,
            },
        })
        .collect()
}
