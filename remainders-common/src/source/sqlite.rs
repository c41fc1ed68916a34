//! SQLite record source
//!
//! Reads the `sended` table, which mirrors the document collection the sending
//! side writes to:
//!
//! ```sql
//! CREATE TABLE sended (
//!     "to"       TEXT NOT NULL,
//!     title      TEXT NOT NULL,
//!     message    TEXT NOT NULL,
//!     "type"     TEXT NOT NULL DEFAULT '',
//!     updated_at TEXT NOT NULL   -- RFC 3339
//! );
//! ```
//!
//! The connection is opened read-only. This service never writes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use super::RecordSource;
use crate::models::StoredRecord;
use crate::search::SearchPhrase;
use crate::{Error, Result};

/// Connection retry policy for startup
#[derive(Debug, Clone, Copy)]
pub struct ConnectRetry {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(10),
        }
    }
}

/// Record source over a read-only SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteRecordSource {
    pool: SqlitePool,
}

impl SqliteRecordSource {
    /// Wrap an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open `database_url`, retrying per `retry`
    ///
    /// Each failed attempt is logged; the last error is returned once
    /// attempts are exhausted.
    pub async fn connect(database_url: &str, retry: ConnectRetry) -> Result<Self> {
        let attempts = retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match SqlitePoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    info!(attempt, "Connected to record database");
                    return Ok(Self::new(pool));
                }
                Err(e) => {
                    warn!(attempt, "Connecting to database failed: {}", e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(retry.delay).await;
                    }
                }
            }
        }

        Err(Error::SourceUnavailable(format!(
            "could not connect after {} attempts: {}",
            attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

/// Translate a sanitized phrase into a case-insensitive `LIKE` pattern
///
/// The phrase alphabet `[0-9A-Za-z.@-]` has no LIKE metacharacters. The only
/// regex metacharacter in it is `.`, which maps to `_` (any single character).
/// SQLite's LIKE is case-insensitive for ASCII, which covers the alphabet.
pub fn like_pattern(phrase: &SearchPhrase) -> String {
    format!("%{}%", phrase.as_str().replace('.', "_"))
}

fn decode_row(row: &SqliteRow) -> std::result::Result<StoredRecord, sqlx::Error> {
    Ok(StoredRecord {
        to: row.try_get("to")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        kind: row.try_get::<Option<String>, _>("type")?.unwrap_or_default(),
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl RecordSource for SqliteRecordSource {
    async fn fetch(
        &self,
        limit: usize,
        filter: Option<&SearchPhrase>,
    ) -> Result<Vec<StoredRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        // updated_at is RFC 3339 text with mixed offsets and precision; order
        // on the instant, not the string

        let rows = match filter {
            Some(phrase) => {
                sqlx::query(
                    r#"SELECT "to", title, message, "type", updated_at
                       FROM sended
                       WHERE "to" LIKE ?
                       ORDER BY julianday(updated_at) DESC
                       LIMIT ?"#,
                )
                .bind(like_pattern(phrase))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"SELECT "to", title, message, "type", updated_at
                       FROM sended
                       ORDER BY julianday(updated_at) DESC
                       LIMIT ?"#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| Error::SourceUnavailable(e.to_string()))?;

        // Undecodable rows are skipped, not fatal
        let records = rows
            .iter()
            .filter_map(|row| match decode_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Decoding stored record failed: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}
