//! Storage abstraction and implementations for learntrack.
//!
//! This crate provides the persistence adapter the progress store writes
//! through, with a JSON file backend and an in-memory backend.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;

pub use trait_::{ProgressStorage, StorageError, Result, PROGRESS_KEY};
pub use json_storage::JsonFileStorage;
pub use memory::MemoryStorage;
