use chrono::NaiveDate;
use thiserror::Error;

/// Failures the accounting core can produce. None of these are fatal to the
/// process; each is scoped to the single user action that triggered it.
#[derive(Debug, Error)]
pub enum QadaError {
    /// Precondition violation: a range must satisfy start <= end.
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Precondition violation: the recurring exclusion cycle is 1-15 days.
    #[error("period days must be between 1 and 15, got {0}")]
    InvalidPeriodDays(u32),

    /// Precondition violation: the caller addressed a range that does not exist.
    #[error("range #{0} does not exist")]
    RangeOutOfBounds(usize),

    /// No progress record exists yet. The caller should route to setup
    /// instead of showing a generic error.
    #[error("no progress record found — run `qada setup` first")]
    NotConfigured,

    /// The durable store failed; the in-memory cache has been rolled back
    /// to the last known-good snapshot. Retryable.
    #[error("storage error")]
    Storage(#[from] rusqlite::Error),

    /// The progress document could not be (de)serialized.
    #[error("progress document is not valid JSON")]
    Serde(#[from] serde_json::Error),

    /// An imported file matched neither the multi-range nor the legacy
    /// single-range document shape. The store is left untouched.
    #[error("unrecognized import format: expected a qada progress document")]
    ImportFormat,
}
