//! Completion records and the progress snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::id::ItemId;
use crate::Time;

/// Completion state of a single catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    /// Whether the item is marked as completed
    pub completed: bool,

    /// When the item was marked completed; only set while `completed` is true
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub completed_at: Option<Time>,

    /// Free-text annotation, kept across completion toggles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompletionRecord {
    /// A record completed at `at`.
    pub fn completed(at: Time) -> Self {
        Self {
            completed: true,
            completed_at: Some(at),
            notes: None,
        }
    }

    /// A not-completed record with no annotation.
    pub fn pending() -> Self {
        Self {
            completed: false,
            completed_at: None,
            notes: None,
        }
    }
}

/// The whole persisted progress state.
///
/// Fields are private: every mutation goes through a method that keeps
/// `total_completed` equal to the number of completed records and bumps
/// `last_updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    records: BTreeMap<ItemId, CompletionRecord>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    last_updated: Time,

    #[serde(default)]
    total_completed: usize,
}

impl ProgressSnapshot {
    /// An empty snapshot, last updated at `now`.
    pub fn empty(now: Time) -> Self {
        Self {
            records: BTreeMap::new(),
            last_updated: now,
            total_completed: 0,
        }
    }

    /// Build a snapshot from externally supplied records.
    ///
    /// Records are normalized and the completed count is recomputed, so
    /// whatever count the source claimed is discarded.
    pub fn from_records(records: BTreeMap<ItemId, CompletionRecord>, now: Time) -> Self {
        let mut snapshot = Self {
            records,
            last_updated: now,
            total_completed: 0,
        };
        snapshot.normalize(now);
        snapshot
    }

    /// Rebuild a previously stored snapshot, keeping its `last_updated`.
    pub fn restore(
        records: BTreeMap<ItemId, CompletionRecord>,
        last_updated: Time,
        now: Time,
    ) -> Self {
        let mut snapshot = Self::from_records(records, now);
        snapshot.last_updated = last_updated;
        snapshot
    }

    /// All records keyed by item id.
    pub fn records(&self) -> &BTreeMap<ItemId, CompletionRecord> {
        &self.records
    }

    /// Record for one item, if any.
    pub fn record(&self, id: &str) -> Option<&CompletionRecord> {
        self.records.get(id)
    }

    /// Whether the item is currently completed.
    pub fn is_completed(&self, id: &str) -> bool {
        self.records.get(id).is_some_and(|r| r.completed)
    }

    /// Ids of completed items, in id order.
    pub fn completed_ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.records
            .iter()
            .filter(|(_, r)| r.completed)
            .map(|(id, _)| id)
    }

    /// Maintained count of completed records.
    pub fn total_completed(&self) -> usize {
        self.total_completed
    }

    /// Time of the most recent mutation.
    pub fn last_updated(&self) -> Time {
        self.last_updated
    }

    /// Flip the completion state of `id`, returning the new state.
    ///
    /// Unknown ids are recorded as completed. Notes are never touched.
    pub fn toggle(&mut self, id: &str, now: Time) -> bool {
        let completed = match self.records.get_mut(id) {
            Some(record) if record.completed => {
                record.completed = false;
                record.completed_at = None;
                self.total_completed = self.total_completed.saturating_sub(1);
                false
            }
            Some(record) => {
                record.completed = true;
                record.completed_at = Some(now);
                self.total_completed += 1;
                true
            }
            None => {
                self.records
                    .insert(ItemId::from(id), CompletionRecord::completed(now));
                self.total_completed += 1;
                true
            }
        };
        self.last_updated = now;
        completed
    }

    /// Set or clear the annotation of `id`.
    ///
    /// Blank notes clear the annotation. A note for an unknown id creates a
    /// not-completed record to hold it.
    pub fn set_notes(&mut self, id: &str, notes: Option<String>, now: Time) {
        let notes = notes.filter(|n| !n.trim().is_empty());
        match self.records.get_mut(id) {
            Some(record) => record.notes = notes,
            None => {
                if notes.is_some() {
                    let mut record = CompletionRecord::pending();
                    record.notes = notes;
                    self.records.insert(ItemId::from(id), record);
                }
            }
        }
        self.last_updated = now;
    }

    /// Count completed records from scratch.
    pub fn recount(&self) -> usize {
        self.records.values().filter(|r| r.completed).count()
    }

    /// Fix `total_completed` from a full recount.
    ///
    /// Returns true when the maintained count was wrong.
    pub fn reconcile(&mut self) -> bool {
        let actual = self.recount();
        if actual == self.total_completed {
            return false;
        }
        self.total_completed = actual;
        true
    }

    /// Re-establish per-record invariants on data from outside.
    ///
    /// A not-completed record loses its `completed_at`; a completed record
    /// without one gets `now`. The completed count is then recounted.
    pub fn normalize(&mut self, now: Time) {
        for record in self.records.values_mut() {
            if !record.completed {
                record.completed_at = None;
            } else if record.completed_at.is_none() {
                record.completed_at = Some(now);
            }
        }
        self.reconcile();
    }
}
