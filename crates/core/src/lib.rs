//! learntrack core data models.
//!
//! This crate defines the progress snapshot that the progress store owns and
//! the read-only catalog the front-end browses.

#![warn(missing_docs)]

// Core identities
mod id;

// Progress tracking
mod progress;

// Reference data
pub mod catalog;

// Re-exports
pub use id::ItemId;
pub use progress::{CompletionRecord, ProgressSnapshot};
pub use catalog::{
    Catalog, CatalogError, Category, CodeAvailability, CodeExample, Comment, Project,
    ProjectQuery, Resource, Showcase, ShowcaseType, SortBy,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
