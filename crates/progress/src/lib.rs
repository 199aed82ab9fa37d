//! Progress Tracking
//!
//! Persisted completion state for a catalog, derived statistics, and
//! import/export/reset.

#![warn(missing_docs)]

pub mod codec;
pub mod stats;
pub mod store;

pub use codec::ImportError;
pub use stats::{completion_percentage, export_file_name, ProgressStats};
pub use store::ProgressStore;
