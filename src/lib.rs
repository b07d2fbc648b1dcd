// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod validate;

// ---- Re-exports for stable public API ----
pub use crate::config::FeedsConfig;
pub use crate::ingest::types::{ArticleRecord, FeedEntry, FeedSource};
pub use crate::ingest::{update_substack, UpdateOutcome};
pub use crate::validate::{default_targets, validate_all, FileStatus, ValidationReport};
