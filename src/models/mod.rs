pub mod error;
pub mod prayer;
pub mod range;
pub mod store;

pub use error::QadaError;
pub use prayer::PrayerType;
pub use range::{ExclusionPolicy, QadaRange};
pub use store::{LegacyProgress, QadaStore, StoredDocument};
