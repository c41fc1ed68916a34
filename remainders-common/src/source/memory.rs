//! In-memory record source
//!
//! Holds a fixed set of records and applies the same ordering, limit and
//! pattern semantics as the database source. Used for tests and local runs
//! seeded from a JSON file.

use std::path::Path;

use async_trait::async_trait;

use super::RecordSource;
use crate::models::StoredRecord;
use crate::search::SearchPhrase;
use crate::{Error, Result};

/// Vec-backed record source
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: Vec<StoredRecord>,
}

impl MemoryRecordSource {
    pub fn new(records: Vec<StoredRecord>) -> Self {
        Self { records }
    }

    /// Load records from a JSON array file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<StoredRecord> = serde_json::from_str(&content).map_err(|e| {
            Error::SourceUnavailable(format!("invalid record file {}: {}", path.display(), e))
        })?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn fetch(
        &self,
        limit: usize,
        filter: Option<&SearchPhrase>,
    ) -> Result<Vec<StoredRecord>> {
        let pattern = filter.map(SearchPhrase::query_regex).transpose()?;

        let mut records: Vec<StoredRecord> = self
            .records
            .iter()
            .filter(|r| pattern.as_ref().map_or(true, |p| p.is_match(&r.to)))
            .cloned()
            .collect();

        // stable: equal timestamps keep insertion order
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(limit);

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(to: &str, minutes: i64) -> StoredRecord {
        StoredRecord {
            to: to.to_string(),
            title: format!("t{}", minutes),
            message: String::new(),
            kind: String::new(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_newest_first_and_limited() {
        let source = MemoryRecordSource::new(vec![
            record("#role#a@a@x", 1),
            record("#role#b@b@x", 3),
            record("#role#c@c@x", 2),
        ]);

        let records = source.fetch(2, None).await.unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["t3", "t2"]);
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive() {
        let source = MemoryRecordSource::new(vec![
            record("#role#teacher1@Bob@x.example", 1),
            record("#role#teacher2@alice@x.example", 2),
        ]);

        let phrase = SearchPhrase::parse("bob").unwrap();
        let records = source.fetch(10, Some(&phrase)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "t1");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r##"[{"to":"#role#teacher1@t@x","title":"A","message":"m","type":"info","updated_at":"2024-01-01T00:00:00Z"}]"##,
        )
        .unwrap();

        let source = MemoryRecordSource::from_json_file(&path).unwrap();
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_from_invalid_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            MemoryRecordSource::from_json_file(&path),
            Err(Error::SourceUnavailable(_))
        ));
    }
}
