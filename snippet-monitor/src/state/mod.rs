//! Durable state between scheduled runs.
//!
//! The only persisted value is the set of zone names seen enabled by the
//! last completed scheduled run, stored as a JSON array under one key.
//! Stores offer plain get/put with no versioning; concurrent writers are
//! last-writer-wins.

mod detector;
mod memory;
mod sqlite;

pub use detector::{ChangeDetector, ChangeSet, ENABLED_ZONES_KEY};
pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

use async_trait::async_trait;

use crate::Result;

/// Minimal key-value store interface.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read `key`. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Unconditionally replace the value of `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
}
