//! Storage trait abstraction.

use async_trait::async_trait;

/// Storage key of the progress snapshot. Bump the suffix when the stored
/// layout changes incompatibly.
pub const PROGRESS_KEY: &str = "learntrack_progress_v1";

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend refused the operation (disabled, quota, injected failure)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Durable key-value slot holding one serialized progress snapshot.
///
/// The store owns its key exclusively. Implementations only move text; they
/// never interpret it.
#[async_trait]
pub trait ProgressStorage: Send + Sync {
    /// Key this storage reads and writes.
    fn key(&self) -> &str;

    /// Read the stored text, `None` when nothing was ever written.
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the stored text.
    async fn write(&mut self, text: &str) -> Result<()>;
}
