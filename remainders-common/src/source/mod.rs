//! Record sources
//!
//! A record source returns stored records newest first (`updated_at`
//! descending), bounded by a limit, optionally narrowed to records whose packed
//! `to` field matches a search phrase case-insensitively.

use async_trait::async_trait;

use crate::models::StoredRecord;
use crate::search::SearchPhrase;
use crate::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRecordSource;
pub use sqlite::{ConnectRetry, SqliteRecordSource};

/// Read-only, sorted, bounded access to stored records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Up to `limit` records, newest first
    ///
    /// With `filter`, only records whose `to` field matches the phrase as a
    /// case-insensitive multiline pattern are considered. Failures are
    /// reported as [`crate::Error::SourceUnavailable`].
    async fn fetch(&self, limit: usize, filter: Option<&SearchPhrase>)
        -> Result<Vec<StoredRecord>>;
}
