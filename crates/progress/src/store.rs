//! Progress store.
//!
//! Owns the canonical [`ProgressSnapshot`] for one storage key and is the only
//! legal mutation path for it. Every mutation is written through to storage
//! before the call returns.
//!
//! Nothing here returns an error to the caller. Unreadable storage loads as
//! "no progress", a failed write is logged and the in-memory snapshot stays
//! authoritative, and a bad import is reported as `false`.

use chrono::Utc;
use learntrack_core::{CompletionRecord, ItemId, ProgressSnapshot, Time};
use learntrack_storage::ProgressStorage;
use tracing::{debug, error, warn};
use crate::codec::{self, ImportError, StoredFormat};
use crate::stats::{completion_percentage, ProgressStats};

type Clock = Box<dyn Fn() -> Time + Send + Sync>;

/// Completion tracking over an injected storage backend.
///
/// A store starts unloaded. Until [`load`](Self::load) (or a reset/import)
/// makes it ready, reads answer "no progress" and toggles are ignored.
pub struct ProgressStore<S: ProgressStorage> {
    storage: S,
    snapshot: Option<ProgressSnapshot>,
    durable: bool,
    clock: Clock,
}

impl<S: ProgressStorage> ProgressStore<S> {
    /// Create an unloaded store.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            snapshot: None,
            durable: true,
            clock: Box::new(Utc::now),
        }
    }

    /// Create a store and load it.
    pub async fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load().await;
        store
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Fn() -> Time + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn now(&self) -> Time {
        (self.clock)()
    }

    /// Whether the snapshot has been loaded.
    pub fn is_ready(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Whether the last write reached storage.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read-only view of the snapshot, `None` before ready.
    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        self.snapshot.as_ref()
    }

    /// Load the snapshot from storage.
    ///
    /// Missing, unreadable or malformed content yields an empty snapshot.
    /// A legacy layout is migrated and written back in the current one.
    pub async fn load(&mut self) {
        let now = self.now();
        let key = self.storage.key().to_string();

        let (snapshot, migrated) = match self.storage.read().await {
            Ok(Some(text)) => match codec::decode_stored(&text, now) {
                Ok((snapshot, format)) => (snapshot, format == StoredFormat::Legacy),
                Err(e) => {
                    warn!(key = %key, error = %e, "stored progress is malformed, starting empty");
                    (ProgressSnapshot::empty(now), false)
                }
            },
            Ok(None) => {
                debug!(key = %key, "no stored progress");
                (ProgressSnapshot::empty(now), false)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read stored progress, starting empty");
                (ProgressSnapshot::empty(now), false)
            }
        };

        debug!(
            key = %key,
            records = snapshot.records().len(),
            completed = snapshot.total_completed(),
            "progress loaded"
        );
        self.snapshot = Some(snapshot);

        if migrated {
            debug!(key = %key, "migrating legacy progress layout");
            self.persist().await;
        }
    }

    /// Flip the completion state of `item_id` and persist.
    ///
    /// Any id is accepted; it is not checked against a catalog.
    pub async fn toggle_completion(&mut self, item_id: &str) {
        let now = self.now();
        let Some(snapshot) = self.snapshot.as_mut() else {
            debug!(item = item_id, "toggle ignored, progress not loaded yet");
            return;
        };
        let completed = snapshot.toggle(item_id, now);
        debug!(item = item_id, completed, "toggled completion");
        self.persist().await;
    }

    /// Set or clear the notes of `item_id` and persist.
    pub async fn set_notes(&mut self, item_id: &str, notes: Option<String>) {
        let now = self.now();
        let Some(snapshot) = self.snapshot.as_mut() else {
            debug!(item = item_id, "notes ignored, progress not loaded yet");
            return;
        };
        snapshot.set_notes(item_id, notes, now);
        self.persist().await;
    }

    /// Whether `item_id` is completed. False for unknown ids or before ready.
    pub fn is_completed(&self, item_id: &str) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|s| s.is_completed(item_id))
    }

    /// Record of `item_id`, if any.
    pub fn record(&self, item_id: &str) -> Option<&CompletionRecord> {
        self.snapshot.as_ref()?.record(item_id)
    }

    /// When `item_id` was completed.
    pub fn completed_at(&self, item_id: &str) -> Option<Time> {
        self.record(item_id)?.completed_at
    }

    /// Notes of `item_id`.
    pub fn notes(&self, item_id: &str) -> Option<&str> {
        self.record(item_id)?.notes.as_deref()
    }

    /// Number of completed items, 0 before ready.
    pub fn completed_count(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.total_completed())
    }

    /// Completed item ids in id order.
    pub fn completed_ids(&self) -> Vec<&ItemId> {
        self.snapshot
            .as_ref()
            .map(|s| s.completed_ids().collect())
            .unwrap_or_default()
    }

    /// Completion percentage against a catalog of `catalog_size` items.
    ///
    /// Rounds halves up; 0 for an empty catalog or before ready.
    pub fn completion_percentage(&self, catalog_size: usize) -> u8 {
        if !self.is_ready() {
            return 0;
        }
        completion_percentage(self.completed_count(), catalog_size)
    }

    /// Everything a progress panel shows.
    pub fn stats(&self, catalog_size: usize) -> ProgressStats {
        ProgressStats {
            completed: self.completed_count(),
            total: catalog_size,
            percentage: self.completion_percentage(catalog_size),
            last_updated: self.snapshot.as_ref().map(|s| s.last_updated()),
        }
    }

    /// Drop all progress and persist the empty snapshot. There is no undo.
    pub async fn reset(&mut self) {
        let now = self.now();
        self.snapshot = Some(ProgressSnapshot::empty(now));
        debug!(key = self.storage.key(), "progress reset");
        self.persist().await;
    }

    /// Recount completed records and fix the maintained count.
    ///
    /// Returns true when a correction was made; only then is it persisted.
    pub async fn reconcile(&mut self) -> bool {
        let Some(snapshot) = self.snapshot.as_mut() else {
            return false;
        };
        let before = snapshot.total_completed();
        if !snapshot.reconcile() {
            return false;
        }
        warn!(before, after = snapshot.total_completed(), "repaired completed count");
        self.persist().await;
        true
    }

    /// Pretty-printed snapshot for saving outside the app.
    ///
    /// Empty before ready.
    pub fn export_snapshot(&self) -> String {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return String::new();
        };
        match codec::encode(snapshot) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "failed to encode progress for export");
                String::new()
            }
        }
    }

    /// Replace progress with an exported snapshot.
    ///
    /// Returns false and leaves the current snapshot untouched when the text
    /// is not a valid export.
    pub async fn import_snapshot(&mut self, text: &str) -> bool {
        match self.try_import_snapshot(text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "rejected progress import");
                false
            }
        }
    }

    /// [`import_snapshot`](Self::import_snapshot) with the rejection reason.
    ///
    /// The completed count is recomputed from the records and `lastUpdated`
    /// is the import time; both fields in the payload are ignored.
    pub async fn try_import_snapshot(&mut self, text: &str) -> Result<(), ImportError> {
        let records = codec::parse_import(text)?;
        let now = self.now();
        let snapshot = ProgressSnapshot::from_records(records, now);
        debug!(
            records = snapshot.records().len(),
            completed = snapshot.total_completed(),
            "imported progress"
        );
        self.snapshot = Some(snapshot);
        self.persist().await;
        Ok(())
    }

    async fn persist(&mut self) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        let text = match codec::encode(snapshot) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "failed to encode progress");
                self.durable = false;
                return;
            }
        };
        match self.storage.write(&text).await {
            Ok(()) => self.durable = true,
            Err(e) => {
                error!(
                    key = self.storage.key(),
                    error = %e,
                    "failed to persist progress, continuing in memory"
                );
                self.durable = false;
            }
        }
    }
}
