//! Tooth topology and bridge range resolution.
//!
//! The anatomical traversal of an arch runs across the midline from the
//! patient's right to left as seen on a chart:
//!
//! ```text
//! upper: 18 17 16 15 14 13 12 11 | 21 22 23 24 25 26 27 28
//! lower: 48 47 46 45 44 43 42 41 | 31 32 33 34 35 36 37 38
//! ```
//!
//! Ranges are contiguous slices of this order, so a bridge from 12 to 22
//! spans the midline and one from 14 to 24 is never confused with 14..18.

use dentplan_model::{Arch, ToothId};

/// Quadrants of an arch: the first is traversed from position 8 down to 1,
/// the second from 1 up to 8.
fn quadrants(arch: Arch) -> (u8, u8) {
    match arch {
        Arch::Upper => (1, 2),
        Arch::Lower => (4, 3),
    }
}

/// The 16 teeth of `arch` in anatomical traversal order.
pub fn arch_order(arch: Arch) -> Vec<ToothId> {
    let (first, second) = quadrants(arch);
    let descending = (1..=8u8).rev().filter_map(|p| ToothId::new(first, p).ok());
    let ascending = (1..=8u8).filter_map(|p| ToothId::new(second, p).ok());
    descending.chain(ascending).collect()
}

/// Index of `tooth` within its arch's traversal order.
pub fn arch_index(tooth: ToothId) -> usize {
    let position = usize::from(tooth.position());
    let (first, _) = quadrants(tooth.arch());
    if tooth.quadrant() == first {
        8 - position
    } else {
        7 + position
    }
}

/// Ordered teeth from `start` to `end` inclusive, or `None` when the two
/// teeth are in different arches.
///
/// The result is always in traversal order regardless of which endpoint
/// comes first, so `resolve_range(a, b) == resolve_range(b, a)`. A range
/// with `start == end` is a single tooth; callers that need a span of at
/// least two teeth must check the length.
pub fn resolve_range(start: ToothId, end: ToothId) -> Option<Vec<ToothId>> {
    if start.arch() != end.arch() {
        return None;
    }
    let order = arch_order(start.arch());
    let a = order.iter().position(|t| *t == start)?;
    let b = order.iter().position(|t| *t == end)?;
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Some(order[lo..=hi].to_vec())
}

/// Sort teeth by arch (upper first) then traversal order.
pub fn sort_anatomically(teeth: &mut [ToothId]) {
    teeth.sort_by_key(|t| (t.arch(), arch_index(*t)));
}
