//! Record models
//!
//! `StoredRecord` is what the document store holds: one notification addressed
//! to a packed batch of recipients. `ResolvedRecord` is one recipient's copy of
//! it after fan-out, and is the unit returned over the API.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Notification as persisted by the sender (read-only here)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Packed recipient field, segments joined by `#role#`
    pub to: String,
    pub title: String,
    /// Message template, may contain the slug placeholder
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Identifier used in diagnostics. The store has no stable id column, so
    /// the timestamp plus title is what operators can search for.
    pub fn diagnostic_id(&self) -> String {
        format!(
            "{} \"{}\"",
            self.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.title
        )
    }
}

/// One recipient's fully resolved message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    /// Recipient email address
    pub to: String,
    pub title: String,
    /// Message with the slug placeholder substituted
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub updated_at: DateTime<Utc>,
}
