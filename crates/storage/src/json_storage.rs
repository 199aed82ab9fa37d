//! JSON file storage implementation.
//!
//! Stores the snapshot as `<root>/<key>.json`. Writes go to a sibling temp
//! file first and are renamed into place, so a crash mid-write leaves the
//! previous snapshot intact.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use super::{ProgressStorage, Result, PROGRESS_KEY};

/// File-based JSON storage backend.
pub struct JsonFileStorage {
    root: PathBuf,
    key: String,
}

impl JsonFileStorage {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            key: PROGRESS_KEY.to_string(),
        })
    }

    /// Use a different storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.key))
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", self.key))
    }
}

#[async_trait]
impl ProgressStorage for JsonFileStorage {
    fn key(&self) -> &str {
        &self.key
    }

    async fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.path()).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        let tmp = self.temp_path();
        fs::write(&tmp, text.as_bytes()).await?;
        fs::rename(&tmp, self.path()).await?;
        debug!(path = %self.path().display(), bytes = text.len(), "wrote progress snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path()).await.unwrap();
        assert!(storage.read().await.unwrap().is_none());
        assert_eq!(storage.key(), PROGRESS_KEY);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("nested")).await.unwrap();

        storage.write("{\"records\":{}}").await.unwrap();
        storage.write("{\"records\":{\"a\":{\"completed\":true}}}").await.unwrap();

        let text = storage.read().await.unwrap().unwrap();
        assert_eq!(text, "{\"records\":{\"a\":{\"completed\":true}}}");
        assert!(storage.path().ends_with("learntrack_progress_v1.json"));
        assert!(!storage.temp_path().exists());
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = JsonFileStorage::new(dir.path()).await.unwrap();
        let second = JsonFileStorage::new(dir.path()).await.unwrap().with_key("other_v1");

        first.write("one").await.unwrap();
        assert!(second.read().await.unwrap().is_none());
        assert_eq!(second.key(), "other_v1");
    }
}
