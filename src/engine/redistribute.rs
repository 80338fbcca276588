//! Waterfall redistribution: mapping an aggregate completed count back onto
//! the per-range records.
//!
//! Individual prayer actions operate on the aggregate dashboard, but storage
//! is range-partitioned, so a single scalar target has to be translated into
//! a consistent set of per-range completed values. Ranges fill oldest-first
//! (their stored order is chronological creation order): a person completes
//! their oldest missed prayers before newer ones, and the fixed order makes
//! the split deterministic, which the optimistic-update reconciliation
//! relies on.

use crate::models::{PrayerType, QadaRange};

/// Distribute `target` completed prayers of type `prayer` across `ranges`
/// in stored order.
///
/// Each range receives `min(remaining, capacity)`; ranges past the point
/// where the target is exhausted are reset to 0 — the whole distribution is
/// recomputed from the target, never patched incrementally. A target above
/// the total capacity fills every range and silently drops the excess.
pub fn redistribute(ranges: &[QadaRange], prayer: PrayerType, target: u32) -> Vec<QadaRange> {
    let mut remaining = target;
    let mut out = ranges.to_vec();
    for range in &mut out {
        let assigned = remaining.min(range.count(prayer));
        range.set_completed(prayer, assigned);
        remaining -= assigned;
    }
    out
}
