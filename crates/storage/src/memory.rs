//! In-memory storage.
//!
//! Clones share the same slot, so a test can keep a handle and inspect what
//! the store wrote after handing the storage over.

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::Mutex;
use super::{ProgressStorage, Result, StorageError, PROGRESS_KEY};

#[derive(Debug, Default)]
struct Slot {
    text: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// Storage backend that keeps the snapshot text in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Slot>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `text`.
    pub fn with_contents(text: impl Into<String>) -> Self {
        let slot = Slot {
            text: Some(text.into()),
            ..Default::default()
        };
        Self {
            slot: Arc::new(Mutex::new(slot)),
        }
    }

    /// Make every read fail.
    pub fn failing_reads(self) -> Self {
        if let Ok(mut slot) = self.slot.try_lock() {
            slot.fail_reads = true;
        }
        self
    }

    /// Make every write fail.
    pub fn failing_writes(self) -> Self {
        if let Ok(mut slot) = self.slot.try_lock() {
            slot.fail_writes = true;
        }
        self
    }

    /// Toggle write failures at runtime.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.slot.lock().await.fail_writes = fail;
    }

    /// Current stored text.
    pub async fn contents(&self) -> Option<String> {
        self.slot.lock().await.text.clone()
    }

    /// Number of successful writes.
    pub async fn write_count(&self) -> usize {
        self.slot.lock().await.writes
    }
}

#[async_trait]
impl ProgressStorage for MemoryStorage {
    fn key(&self) -> &str {
        PROGRESS_KEY
    }

    async fn read(&self) -> Result<Option<String>> {
        let slot = self.slot.lock().await;
        if slot.fail_reads {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        Ok(slot.text.clone())
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if slot.fail_writes {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        slot.text = Some(text.to_string());
        slot.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_slot() {
        let handle = MemoryStorage::new();
        let mut storage = handle.clone();

        storage.write("hello").await.unwrap();
        assert_eq!(handle.contents().await.as_deref(), Some("hello"));
        assert_eq!(handle.write_count().await, 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let storage = MemoryStorage::with_contents("x").failing_reads();
        assert!(matches!(storage.read().await, Err(StorageError::Unavailable(_))));

        let mut storage = MemoryStorage::new().failing_writes();
        assert!(storage.write("y").await.is_err());
        assert!(storage.contents().await.is_none());

        storage.set_fail_writes(false).await;
        storage.write("y").await.unwrap();
        assert_eq!(storage.contents().await.as_deref(), Some("y"));
    }
}
