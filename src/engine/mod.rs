pub mod aggregate;
pub mod dates;
pub mod redistribute;

pub use aggregate::{aggregate, AggregatedQada, PrayerTotals};
pub use redistribute::redistribute;
