//! Store-wide aggregation of per-range counts.

use crate::models::{PrayerType, QadaRange};

/// Summed owed/completed counts for one prayer type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrayerTotals {
    pub count: u32,
    pub completed: u32,
}

impl PrayerTotals {
    pub fn remaining(&self) -> u32 {
        self.count.saturating_sub(self.completed)
    }
}

/// Per-prayer totals across every range in the store. Derived on demand,
/// never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatedQada {
    totals: [PrayerTotals; 5],
}

impl AggregatedQada {
    pub fn get(&self, prayer: PrayerType) -> PrayerTotals {
        self.totals[prayer.index()]
    }

    pub fn total_count(&self) -> u32 {
        self.totals.iter().map(|t| t.count).sum()
    }

    pub fn total_completed(&self) -> u32 {
        self.totals.iter().map(|t| t.completed).sum()
    }

    pub fn total_remaining(&self) -> u32 {
        self.total_count().saturating_sub(self.total_completed())
    }
}

/// Sum counts and completed per prayer across all ranges. Addition is
/// commutative, so range order does not affect the result; an empty slice
/// yields all zeros.
pub fn aggregate(ranges: &[QadaRange]) -> AggregatedQada {
    let mut agg = AggregatedQada::default();
    for range in ranges {
        for prayer in PrayerType::all() {
            let slot = &mut agg.totals[prayer.index()];
            slot.count += range.count(prayer);
            slot.completed += range.completed(prayer);
        }
    }
    agg
}
