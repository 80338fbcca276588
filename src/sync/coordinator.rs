//! Read-modify-write orchestration over the progress store.
//!
//! Every mutation follows the same optimistic protocol: snapshot the cached
//! store, compute the next store with the pure engines, publish it to the
//! cache and subscribers, then persist. Persistence failure restores the
//! snapshot; success re-reads the durable copy to reconcile. The engines are
//! deterministic over the ordered range list, so absent external writes the
//! optimistic projection and the persisted result are identical.
//!
//! Single-writer model: callers must serialize mutations (one in flight at a
//! time). The coordinator does not provide mutual exclusion across callers.

use chrono::NaiveDate;
use log::warn;

use crate::db::{ProgressBackend, ProgressRepo};
use crate::engine::{aggregate, redistribute, AggregatedQada};
use crate::models::{ExclusionPolicy, PrayerType, QadaError, QadaRange, QadaStore, StoredDocument};

/// Where the last mutation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    /// Optimistically published, not yet durable.
    Pending,
    Committed,
    /// Persistence failed; the cache was restored from the snapshot.
    RolledBack,
}

pub type Subscriber = Box<dyn Fn(&QadaStore)>;

/// The observable owner of the cached [`QadaStore`].
pub struct QadaTracker<B: ProgressBackend> {
    backend: B,
    policy: ExclusionPolicy,
    cache: Option<QadaStore>,
    subscribers: Vec<Subscriber>,
    state: MutationState,
}

impl<B: ProgressBackend> QadaTracker<B> {
    /// Load (and, for legacy documents, migrate) the persisted store into
    /// the cache.
    pub fn open(backend: B, policy: ExclusionPolicy) -> Result<Self, QadaError> {
        let cache = ProgressRepo::load(&backend)?;
        Ok(Self {
            backend,
            policy,
            cache,
            subscribers: Vec::new(),
            state: MutationState::Idle,
        })
    }

    pub fn store(&self) -> Option<&QadaStore> {
        self.cache.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.cache.is_some()
    }

    pub fn mutation_state(&self) -> MutationState {
        self.state
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    /// Aggregate view of the cached store; all zeros when unconfigured.
    pub fn aggregated(&self) -> AggregatedQada {
        self.cache
            .as_ref()
            .map(|store| aggregate(&store.ranges))
            .unwrap_or_default()
    }

    fn current(&self) -> Result<&QadaStore, QadaError> {
        self.cache.as_ref().ok_or(QadaError::NotConfigured)
    }

    fn notify(&self) {
        if let Some(store) = &self.cache {
            for subscriber in &self.subscribers {
                subscriber(store);
            }
        }
    }

    /// The optimistic commit cycle shared by every mutation. `next` has
    /// already been validated; from here on the only failure mode is
    /// persistence.
    fn commit(&mut self, mut next: QadaStore) -> Result<(), QadaError> {
        let snapshot = self.cache.clone();

        self.state = MutationState::Pending;
        self.cache = Some(next.clone());
        self.notify();

        match ProgressRepo::save(&self.backend, &mut next) {
            Ok(()) => {
                // Reconcile with what was actually written. If the re-read
                // fails we keep the optimistic copy; the next load will
                // converge.
                match ProgressRepo::load(&self.backend) {
                    Ok(Some(stored)) => self.cache = Some(stored),
                    Ok(None) => self.cache = Some(next),
                    Err(err) => {
                        warn!("could not re-read progress after save: {err}");
                        self.cache = Some(next);
                    }
                }
                self.state = MutationState::Committed;
                self.notify();
                Ok(())
            }
            Err(err) => {
                warn!("persisting progress failed, rolling back: {err}");
                self.cache = snapshot;
                self.state = MutationState::RolledBack;
                self.notify();
                Err(err)
            }
        }
    }

    // ─── Setup ───────────────────────────────────────────────────────────────

    /// First-time setup: create the store with its initial range. Replaces
    /// any existing store — callers gate on `is_configured`.
    pub fn setup(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        exclude_jomaa: bool,
        exclude_period: bool,
        period_days: u32,
    ) -> Result<(), QadaError> {
        let range = QadaRange::create(
            start,
            end,
            exclude_jomaa,
            exclude_period,
            period_days,
            &self.policy,
        )?;
        self.commit(QadaStore::new(vec![range]))
    }

    // ─── Aggregate operations ────────────────────────────────────────────────

    /// Set the store-wide completed count for one prayer; the waterfall
    /// spreads it across ranges oldest-first, capped at total capacity.
    pub fn set_prayer_completed(
        &mut self,
        prayer: PrayerType,
        target: u32,
    ) -> Result<(), QadaError> {
        let store = self.current()?;
        let mut next = store.clone();
        next.ranges = redistribute(&store.ranges, prayer, target);
        self.commit(next)
    }

    pub fn increment_prayer(&mut self, prayer: PrayerType, by: u32) -> Result<(), QadaError> {
        let completed = self.aggregated_completed(prayer)?;
        self.set_prayer_completed(prayer, completed.saturating_add(by))
    }

    pub fn decrement_prayer(&mut self, prayer: PrayerType, by: u32) -> Result<(), QadaError> {
        let completed = self.aggregated_completed(prayer)?;
        self.set_prayer_completed(prayer, completed.saturating_sub(by))
    }

    fn aggregated_completed(&self, prayer: PrayerType) -> Result<u32, QadaError> {
        let store = self.current()?;
        Ok(aggregate(&store.ranges).get(prayer).completed)
    }

    // ─── Range operations ────────────────────────────────────────────────────

    pub fn add_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        exclude_jomaa: bool,
        exclude_period: bool,
        period_days: u32,
    ) -> Result<(), QadaError> {
        let range = QadaRange::create(
            start,
            end,
            exclude_jomaa,
            exclude_period,
            period_days,
            &self.policy,
        )?;
        let mut next = self.current()?.clone();
        next.append_range(range);
        self.commit(next)
    }

    pub fn edit_range(
        &mut self,
        index: usize,
        start: NaiveDate,
        end: NaiveDate,
        exclude_jomaa: bool,
        exclude_period: bool,
        period_days: u32,
    ) -> Result<(), QadaError> {
        let store = self.current()?;
        let edited = store.range(index)?.edit(
            start,
            end,
            exclude_jomaa,
            exclude_period,
            period_days,
            &self.policy,
        )?;
        let mut next = store.clone();
        next.replace_range(index, edited)?;
        self.commit(next)
    }

    pub fn remove_range(&mut self, index: usize) -> Result<(), QadaError> {
        let mut next = self.current()?.clone();
        next.remove_range(index)?;
        self.commit(next)
    }

    /// Write one range's completed count directly, bypassing redistribution.
    /// Clamped to that range's capacity.
    pub fn set_range_completed(
        &mut self,
        index: usize,
        prayer: PrayerType,
        value: u32,
    ) -> Result<(), QadaError> {
        let mut next = self.current()?.clone();
        next.range(index)?;
        next.ranges[index].set_completed(prayer, value);
        self.commit(next)
    }

    /// ±1 on one range's completed count, with the usual clamping.
    pub fn adjust_range_completed(
        &mut self,
        index: usize,
        prayer: PrayerType,
        delta: i64,
    ) -> Result<(), QadaError> {
        let mut next = self.current()?.clone();
        next.range(index)?;
        next.ranges[index].adjust_completed(prayer, delta);
        self.commit(next)
    }

    // ─── Import / export ─────────────────────────────────────────────────────

    /// Replace the whole store with an imported document. All-or-nothing:
    /// the document must parse as one of the known shapes before anything
    /// is touched.
    pub fn import_document(&mut self, raw: &str) -> Result<(), QadaError> {
        let store = StoredDocument::parse(raw)?.into_latest();
        self.commit(store)
    }

    /// The full document verbatim, including the `id` discriminator.
    pub fn export_document(&self) -> Result<String, QadaError> {
        Ok(serde_json::to_string_pretty(self.current()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tracker() -> QadaTracker<MemoryBackend> {
        QadaTracker::open(MemoryBackend::default(), ExclusionPolicy::default()).unwrap()
    }

    /// Backend whose writes always fail, for exercising rollback.
    struct FailingBackend;

    impl ProgressBackend for FailingBackend {
        fn get(&self) -> Result<Option<String>, QadaError> {
            Ok(None)
        }
        fn put(&self, _document: &str) -> Result<(), QadaError> {
            Err(QadaError::Storage(rusqlite::Error::InvalidParameterName(
                "disk unavailable".into(),
            )))
        }
    }

    #[test]
    fn mutating_unconfigured_store_is_not_found() {
        let mut t = tracker();
        assert!(!t.is_configured());
        assert!(matches!(
            t.increment_prayer(PrayerType::Fajr, 1),
            Err(QadaError::NotConfigured)
        ));
        assert!(matches!(t.export_document(), Err(QadaError::NotConfigured)));
    }

    #[test]
    fn increments_cap_at_capacity() {
        // 10-day range, no exclusions: every count is 10.
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-10"), false, false, 7).unwrap();

        for _ in 0..12 {
            t.increment_prayer(PrayerType::Fajr, 1).unwrap();
        }
        let agg = t.aggregated();
        assert_eq!(agg.get(PrayerType::Fajr).completed, 10);
        assert_eq!(t.store().unwrap().ranges[0].fajr_completed, 10);
    }

    #[test]
    fn aggregate_increments_waterfall_across_ranges() {
        // Capacities 3 and 4 for every prayer.
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        t.add_range(d("2024-02-01"), d("2024-02-04"), false, false, 7).unwrap();

        for _ in 0..5 {
            t.increment_prayer(PrayerType::Fajr, 1).unwrap();
        }
        let store = t.store().unwrap();
        assert_eq!(store.ranges[0].fajr_completed, 3);
        assert_eq!(store.ranges[1].fajr_completed, 2);
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        t.decrement_prayer(PrayerType::Isha, 1).unwrap();
        assert_eq!(t.aggregated().get(PrayerType::Isha).completed, 0);
    }

    #[test]
    fn removing_a_range_reaggregates() {
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        t.add_range(d("2024-02-01"), d("2024-02-04"), false, false, 7).unwrap();
        t.set_prayer_completed(PrayerType::Fajr, 5).unwrap();

        t.remove_range(0).unwrap();
        let agg = t.aggregated();
        // Only the second range's share survives; nothing is carried over.
        assert_eq!(agg.get(PrayerType::Fajr).completed, 2);
        assert_eq!(agg.get(PrayerType::Fajr).count, 4);
    }

    #[test]
    fn remove_out_of_bounds_is_a_precondition_error() {
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        assert!(matches!(
            t.remove_range(5),
            Err(QadaError::RangeOutOfBounds(5))
        ));
        // The store was not touched.
        assert_eq!(t.store().unwrap().ranges.len(), 1);
        assert_eq!(t.mutation_state(), MutationState::Committed);
    }

    #[test]
    fn range_local_ops_bypass_redistribution() {
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        t.add_range(d("2024-02-01"), d("2024-02-04"), false, false, 7).unwrap();

        // Writing range 1 directly leaves range 0 at zero, which the
        // waterfall would never do.
        t.set_range_completed(1, PrayerType::Fajr, 4).unwrap();
        let store = t.store().unwrap();
        assert_eq!(store.ranges[0].fajr_completed, 0);
        assert_eq!(store.ranges[1].fajr_completed, 4);

        t.adjust_range_completed(1, PrayerType::Fajr, -1).unwrap();
        assert_eq!(t.store().unwrap().ranges[1].fajr_completed, 3);
    }

    #[test]
    fn persistence_failure_rolls_back_to_snapshot() {
        let mut t =
            QadaTracker::open(FailingBackend, ExclusionPolicy::default()).unwrap();
        let err = t.setup(d("2024-01-01"), d("2024-01-10"), false, false, 7);
        assert!(matches!(err, Err(QadaError::Storage(_))));
        assert!(!t.is_configured());
        assert_eq!(t.mutation_state(), MutationState::RolledBack);
    }

    #[test]
    fn edits_persist_through_the_backend() {
        let backend = MemoryBackend::default();
        let mut t = QadaTracker::open(backend, ExclusionPolicy::default()).unwrap();
        t.setup(d("2024-01-01"), d("2024-01-10"), false, false, 7).unwrap();
        t.edit_range(0, d("2024-01-01"), d("2024-01-05"), false, false, 7)
            .unwrap();
        assert_eq!(t.store().unwrap().ranges[0].fajr_count, 5);
        assert_eq!(t.mutation_state(), MutationState::Committed);
    }

    #[test]
    fn subscribers_see_each_published_state() {
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let seen_by_sub = Rc::clone(&seen);

        let mut t = tracker();
        t.subscribe(Box::new(move |store| {
            seen_by_sub.borrow_mut().push(store.ranges.len());
        }));

        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        t.add_range(d("2024-02-01"), d("2024-02-04"), false, false, 7).unwrap();

        // Optimistic publish + committed reconcile per mutation.
        assert_eq!(*seen.borrow(), vec![1, 1, 2, 2]);
    }

    #[test]
    fn import_legacy_document_replaces_store() {
        let mut t = tracker();
        t.import_document(
            r#"{"missedStartDate":"2023-05-01","missedEndDate":"2023-05-10",
                "fajrCount":10,"fajrCompleted":3}"#,
        )
        .unwrap();
        let store = t.store().unwrap();
        assert_eq!(store.ranges.len(), 1);
        assert_eq!(store.ranges[0].fajr_completed, 3);
    }

    #[test]
    fn bad_import_leaves_store_untouched() {
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        let before = t.store().unwrap().clone();

        assert!(matches!(
            t.import_document("{\"junk\": true}"),
            Err(QadaError::ImportFormat)
        ));
        assert_eq!(t.store().unwrap(), &before);
    }

    #[test]
    fn export_includes_id_discriminator() {
        let mut t = tracker();
        t.setup(d("2024-01-01"), d("2024-01-03"), false, false, 7).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&t.export_document().unwrap()).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json["ranges"].is_array());
        assert!(json["updatedAt"].is_string());
    }
}
