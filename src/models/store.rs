use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{QadaError, QadaRange};

/// The singleton document is always stored under this id, matching the
/// original progress database.
pub const STORE_ID: i64 = 1;

fn default_store_id() -> i64 {
    STORE_ID
}

/// The persisted collection: every missed-prayer range in creation order
/// plus the last-mutation timestamp.
///
/// Range order is semantically meaningful (oldest first — redistribution
/// fills in this order) and must survive edits and deletions. The document
/// is always read-modify-written as a whole; there are no field-level
/// writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QadaStore {
    #[serde(default = "default_store_id")]
    pub id: i64,
    pub ranges: Vec<QadaRange>,
    pub updated_at: DateTime<Utc>,
}

impl QadaStore {
    pub fn new(ranges: Vec<QadaRange>) -> Self {
        Self {
            id: STORE_ID,
            ranges,
            updated_at: Utc::now(),
        }
    }

    pub fn range(&self, index: usize) -> Result<&QadaRange, QadaError> {
        self.ranges.get(index).ok_or(QadaError::RangeOutOfBounds(index))
    }

    pub fn append_range(&mut self, range: QadaRange) {
        self.ranges.push(range);
    }

    /// Remove a range; the order of the survivors is preserved.
    pub fn remove_range(&mut self, index: usize) -> Result<QadaRange, QadaError> {
        if index >= self.ranges.len() {
            return Err(QadaError::RangeOutOfBounds(index));
        }
        Ok(self.ranges.remove(index))
    }

    /// Swap in an edited range at the same position.
    pub fn replace_range(&mut self, index: usize, range: QadaRange) -> Result<(), QadaError> {
        let slot = self
            .ranges
            .get_mut(index)
            .ok_or(QadaError::RangeOutOfBounds(index))?;
        *slot = range;
        Ok(())
    }
}

/// The pre-multi-range document shape: the same per-prayer fields at the top
/// level and no `ranges` wrapper. Retained only as an import/migration
/// source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProgress {
    pub missed_start_date: NaiveDate,
    pub missed_end_date: NaiveDate,
    #[serde(default)]
    pub fajr_count: u32,
    #[serde(default)]
    pub dhuhr_count: u32,
    #[serde(default)]
    pub asr_count: u32,
    #[serde(default)]
    pub maghrib_count: u32,
    #[serde(default)]
    pub isha_count: u32,
    #[serde(default)]
    pub fajr_completed: u32,
    #[serde(default)]
    pub dhuhr_completed: u32,
    #[serde(default)]
    pub asr_completed: u32,
    #[serde(default)]
    pub maghrib_completed: u32,
    #[serde(default)]
    pub isha_completed: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LegacyProgress {
    /// Wrap the single record as a one-element range list, preserving all
    /// counts. The v1 -> v2 migration.
    pub fn into_store(self) -> QadaStore {
        let range = QadaRange {
            missed_start_date: self.missed_start_date,
            missed_end_date: self.missed_end_date,
            exclude_jomaa: false,
            exclude_period: false,
            period_days: 7,
            fajr_count: self.fajr_count,
            dhuhr_count: self.dhuhr_count,
            asr_count: self.asr_count,
            maghrib_count: self.maghrib_count,
            isha_count: self.isha_count,
            fajr_completed: self.fajr_completed,
            dhuhr_completed: self.dhuhr_completed,
            asr_completed: self.asr_completed,
            maghrib_completed: self.maghrib_completed,
            isha_completed: self.isha_completed,
        };
        QadaStore {
            id: STORE_ID,
            ranges: vec![range],
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Every document shape this app has ever persisted, as an explicit union.
/// Loading and importing both go through here, so the rest of the code only
/// ever sees the latest shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StoredDocument {
    /// Current shape: has a `ranges` array.
    MultiRange(QadaStore),
    /// v1 shape: `missedStartDate` at the top level, no `ranges`.
    Legacy(LegacyProgress),
}

impl StoredDocument {
    /// Parse either document shape; anything else is a format error.
    pub fn parse(raw: &str) -> Result<Self, QadaError> {
        serde_json::from_str(raw).map_err(|_| QadaError::ImportFormat)
    }

    /// Was this document stored in a pre-current shape?
    pub fn needs_migration(&self) -> bool {
        matches!(self, StoredDocument::Legacy(_))
    }

    pub fn into_latest(self) -> QadaStore {
        match self {
            StoredDocument::MultiRange(store) => store,
            StoredDocument::Legacy(legacy) => legacy.into_store(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrayerType;

    const LEGACY_DOC: &str = r#"{
        "id": 1,
        "missedStartDate": "2023-05-01",
        "missedEndDate": "2023-05-10",
        "fajrCount": 10,
        "dhuhrCount": 10,
        "asrCount": 10,
        "maghribCount": 10,
        "ishaCount": 10,
        "fajrCompleted": 3,
        "updatedAt": "2023-06-01T12:00:00Z"
    }"#;

    #[test]
    fn legacy_document_converts_to_one_range() {
        let doc = StoredDocument::parse(LEGACY_DOC).unwrap();
        assert!(doc.needs_migration());
        let store = doc.into_latest();
        assert_eq!(store.ranges.len(), 1);
        assert_eq!(store.ranges[0].fajr_count, 10);
        assert_eq!(store.ranges[0].fajr_completed, 3);
        assert_eq!(store.ranges[0].dhuhr_completed, 0);
        assert_eq!(store.updated_at.to_rfc3339(), "2023-06-01T12:00:00+00:00");
    }

    #[test]
    fn multi_range_document_parses_as_is() {
        let doc = StoredDocument::parse(
            r#"{
                "id": 1,
                "ranges": [{
                    "missedStartDate": "2024-01-01",
                    "missedEndDate": "2024-01-10",
                    "fajrCount": 10, "dhuhrCount": 10, "asrCount": 10,
                    "maghribCount": 10, "ishaCount": 10,
                    "fajrCompleted": 4, "dhuhrCompleted": 0, "asrCompleted": 0,
                    "maghribCompleted": 0, "ishaCompleted": 0
                }],
                "updatedAt": "2024-02-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(!doc.needs_migration());
        let store = doc.into_latest();
        assert_eq!(store.ranges[0].completed(PrayerType::Fajr), 4);
        // Optional exclusion fields default off.
        assert!(!store.ranges[0].exclude_jomaa);
        assert_eq!(store.ranges[0].period_days, 7);
    }

    #[test]
    fn unknown_shapes_are_format_errors() {
        for raw in [r#"{"foo": 1}"#, "[]", "42", "not json"] {
            assert!(matches!(
                StoredDocument::parse(raw),
                Err(QadaError::ImportFormat)
            ));
        }
    }

    #[test]
    fn round_trips_through_json() {
        let doc = StoredDocument::parse(LEGACY_DOC).unwrap();
        let store = doc.into_latest();
        let json = serde_json::to_string(&store).unwrap();
        let back = StoredDocument::parse(&json).unwrap();
        assert!(!back.needs_migration());
        assert_eq!(back.into_latest(), store);
    }

    #[test]
    fn remove_range_checks_bounds() {
        let mut store = QadaStore::new(vec![]);
        assert!(matches!(
            store.remove_range(0),
            Err(QadaError::RangeOutOfBounds(0))
        ));
    }
}
