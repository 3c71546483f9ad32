//! Fixed-point merging of top-level blocks and tables.
//!
//! Markup-order assembly can leave two blocks apart that only turn out to
//! be neighbours once later content has arrived. The pass sweeps every
//! pair until a sweep merges nothing; each merge removes one box, so the
//! loop terminates.

use tracing::debug;

use crate::lines::LineRegistry;
use crate::params::SomParams;
use crate::som::{FixedBlock, SemanticBox};
use crate::table::absorb_table;

fn blocks_combinable(
    a: &FixedBlock,
    b: &FixedBlock,
    registry: &LineRegistry,
    params: &SomParams,
) -> bool {
    let m = params.combine_inflate;
    a.transform == b.transform
        && !a.is_floating_image
        && !b.is_floating_image
        && !a.is_whitespace
        && !b.is_whitespace
        && a.bbox.inflate(m, m).intersects(&b.bbox)
        && !runs_separated(a, b, registry)
}

/// True if a ruling line runs between any run of `a` and any run of `b`.
/// Block rectangles can overlap while their runs sit on opposite sides of
/// a rule, so the test is per run.
fn runs_separated(a: &FixedBlock, b: &FixedBlock, registry: &LineRegistry) -> bool {
    if registry.is_empty() {
        return false;
    }
    a.runs()
        .any(|ra| b.runs().any(|rb| registry.separates(&ra.bbox, &rb.bbox)))
}

/// Tries to merge `boxes[j]` into `boxes[i]`, or to nest one table in
/// the other. Returns true if one box was removed.
fn try_merge(
    boxes: &mut Vec<SemanticBox>,
    i: usize,
    j: usize,
    registry: &LineRegistry,
    params: &SomParams,
) -> bool {
    let tol = params.table_tolerance;
    let (host, guest) = match (&boxes[i], &boxes[j]) {
        (SemanticBox::FixedBlock(a), SemanticBox::FixedBlock(b)) => {
            if !blocks_combinable(a, b, registry, params) {
                return false;
            }
            (i, j)
        }
        (SemanticBox::Table(a), SemanticBox::Table(b)) => {
            if a.bbox.contains(&b.bbox, tol) {
                (i, j)
            } else if b.bbox.contains(&a.bbox, tol) {
                (j, i)
            } else {
                return false;
            }
        }
        _ => return false,
    };

    let removed = boxes.remove(guest);
    let host = if guest < host { host - 1 } else { host };
    let outcome = match (&mut boxes[host], removed) {
        (SemanticBox::FixedBlock(a), SemanticBox::FixedBlock(b)) => {
            a.merge(b);
            Ok(())
        }
        (SemanticBox::Table(h), SemanticBox::Table(t)) => {
            absorb_table(h, t, tol).map_err(SemanticBox::Table)
        }
        (_, other) => Err(other),
    };
    match outcome {
        Ok(()) => true,
        Err(back) => {
            boxes.insert(guest, back);
            false
        }
    }
}

fn sweep(boxes: &mut Vec<SemanticBox>, registry: &LineRegistry, params: &SomParams) -> usize {
    let mut merges = 0;
    let mut i = 0;
    while i < boxes.len() {
        let mut j = i + 1;
        while j < boxes.len() {
            if try_merge(boxes, i, j, registry, params) {
                merges += 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    merges
}

/// Merges top-level blocks and nests top-level tables until nothing
/// changes. Returns the number of merges.
pub fn combine_pass(
    boxes: &mut Vec<SemanticBox>,
    registry: &LineRegistry,
    params: &SomParams,
) -> usize {
    let mut total = 0;
    for round in 1.. {
        let merges = sweep(boxes, registry, params);
        debug!(round, merges, remaining = boxes.len(), "combine sweep");
        total += merges;
        if merges == 0 {
            break;
        }
    }
    total
}
