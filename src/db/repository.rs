use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;

use crate::models::store::STORE_ID;
use crate::models::{QadaError, QadaStore, StoredDocument};

/// The persistence collaborator: a keyed record store holding one JSON
/// document under a constant singleton key. Backends are interchangeable —
/// the core only needs get/put semantics.
pub trait ProgressBackend {
    fn get(&self) -> Result<Option<String>, QadaError>;
    fn put(&self, document: &str) -> Result<(), QadaError>;
}

// ─── SQLite backend ──────────────────────────────────────────────────────────

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ProgressBackend for SqliteBackend {
    fn get(&self) -> Result<Option<String>, QadaError> {
        let raw = self
            .conn
            .query_row(
                "SELECT document FROM qada_progress WHERE id = ?1",
                params![STORE_ID],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    fn put(&self, document: &str) -> Result<(), QadaError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO qada_progress (id, document, saved_at)
             VALUES (?1, ?2, datetime('now'))",
            params![STORE_ID, document],
        )?;
        Ok(())
    }
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// Map-backed stand-in for the SQLite backend. Single-threaded like the rest
/// of the app, hence the plain `RefCell`.
#[derive(Default)]
pub struct MemoryBackend {
    document: RefCell<Option<String>>,
}

impl ProgressBackend for MemoryBackend {
    fn get(&self) -> Result<Option<String>, QadaError> {
        Ok(self.document.borrow().clone())
    }

    fn put(&self, document: &str) -> Result<(), QadaError> {
        *self.document.borrow_mut() = Some(document.to_string());
        Ok(())
    }
}

// ─── Progress repo ───────────────────────────────────────────────────────────

pub struct ProgressRepo;

impl ProgressRepo {
    /// Load the singleton document, upgrading a legacy single-range shape to
    /// the current one. The migrated document is written back immediately,
    /// so the upgrade happens exactly once per store.
    pub fn load<B: ProgressBackend>(backend: &B) -> Result<Option<QadaStore>, QadaError> {
        let Some(raw) = backend.get()? else {
            return Ok(None);
        };
        let doc = StoredDocument::parse(&raw)?;
        if doc.needs_migration() {
            let store = doc.into_latest();
            backend.put(&serde_json::to_string(&store)?)?;
            info!("migrated legacy single-range progress document");
            return Ok(Some(store));
        }
        Ok(Some(doc.into_latest()))
    }

    /// Full-document overwrite; stamps `updated_at` on every save.
    pub fn save<B: ProgressBackend>(
        backend: &B,
        store: &mut QadaStore,
    ) -> Result<(), QadaError> {
        store.updated_at = chrono::Utc::now();
        backend.put(&serde_json::to_string(store)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::range::ExclusionPolicy;
    use crate::models::{PrayerType, QadaRange};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sqlite_backend() -> SqliteBackend {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        SqliteBackend::new(conn)
    }

    fn sample_store() -> QadaStore {
        let range = QadaRange::create(
            d("2024-01-01"),
            d("2024-01-10"),
            false,
            false,
            7,
            &ExclusionPolicy::default(),
        )
        .unwrap();
        QadaStore::new(vec![range])
    }

    #[test]
    fn load_on_empty_store_is_none() {
        let backend = sqlite_backend();
        assert!(ProgressRepo::load(&backend).unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let backend = sqlite_backend();
        let mut store = sample_store();
        ProgressRepo::save(&backend, &mut store).unwrap();

        let loaded = ProgressRepo::load(&backend).unwrap().unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn save_stamps_updated_at() {
        let backend = sqlite_backend();
        let mut store = sample_store();
        let before = store.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        ProgressRepo::save(&backend, &mut store).unwrap();
        assert!(store.updated_at > before);
    }

    #[test]
    fn legacy_document_is_migrated_once_on_load() {
        let backend = sqlite_backend();
        backend
            .put(
                r#"{"id":1,"missedStartDate":"2023-05-01","missedEndDate":"2023-05-10",
                    "fajrCount":10,"dhuhrCount":10,"asrCount":10,"maghribCount":10,
                    "ishaCount":10,"fajrCompleted":3}"#,
            )
            .unwrap();

        let store = ProgressRepo::load(&backend).unwrap().unwrap();
        assert_eq!(store.ranges.len(), 1);
        assert_eq!(store.ranges[0].completed(PrayerType::Fajr), 3);

        // The upgraded shape was written back: the raw document now parses
        // as multi-range.
        let raw = backend.get().unwrap().unwrap();
        let doc = StoredDocument::parse(&raw).unwrap();
        assert!(!doc.needs_migration());
    }

    #[test]
    fn corrupt_document_is_a_format_error() {
        let backend = MemoryBackend::default();
        backend.put("{\"nonsense\":true}").unwrap();
        assert!(matches!(
            ProgressRepo::load(&backend),
            Err(QadaError::ImportFormat)
        ));
    }
}
