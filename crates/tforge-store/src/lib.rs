//! Durable trend source configuration.
//!
//! One SQLite table, `trend_sources`, keyed by source name. The store is
//! synchronous; async callers move work onto a blocking thread.

pub mod error;
pub mod sources;

pub use error::{StoreError, StoreResult};
pub use sources::{TrendSourceStore, DEFAULT_DB_PATH};
