//! Result pipeline
//!
//! Fetch → fan out → (search only) filter by resolved recipient.
//!
//! The query-level filter matches the *packed* `to` field, which may hold
//! several recipients. Only the post fan-out substring check guarantees that
//! each returned record's own recipient matches, so both filters run.

use std::sync::Arc;

use tracing::debug;

use crate::models::ResolvedRecord;
use crate::resolve::FanoutEngine;
use crate::search::SearchPhrase;
use crate::source::RecordSource;
use crate::Result;

/// Stored records fetched for the latest view
pub const LATEST_LIMIT: usize = 25;

/// Stored records fetched for a search
pub const SEARCH_LIMIT: usize = 200;

/// Stateless request pipeline; cheap to clone
#[derive(Clone)]
pub struct ResultPipeline {
    source: Arc<dyn RecordSource>,
    engine: Arc<FanoutEngine>,
}

impl ResultPipeline {
    pub fn new(source: Arc<dyn RecordSource>, engine: FanoutEngine) -> Self {
        Self {
            source,
            engine: Arc::new(engine),
        }
    }

    /// Resolved records of the most recently updated stored records
    pub async fn resolve_latest(&self) -> Result<Vec<ResolvedRecord>> {
        let records = self.source.fetch(LATEST_LIMIT, None).await?;
        let resolved = self.engine.fan_out_all(&records)?;

        debug!(
            fetched = records.len(),
            resolved = resolved.len(),
            "Resolved latest remainders"
        );
        Ok(resolved)
    }

    /// Resolved records whose recipient address contains the sanitized phrase
    pub async fn resolve_search(&self, raw_phrase: &str) -> Result<Vec<ResolvedRecord>> {
        let phrase = SearchPhrase::parse(raw_phrase)?;

        let records = self.source.fetch(SEARCH_LIMIT, Some(&phrase)).await?;
        let mut resolved = self.engine.fan_out_all(&records)?;
        let before_filter = resolved.len();
        resolved.retain(|r| phrase.matches_recipient(&r.to));

        debug!(
            phrase = %phrase,
            raw_len = raw_phrase.len(),
            fetched = records.len(),
            fanned_out = before_filter,
            matched = resolved.len(),
            "Resolved remainder search"
        );
        Ok(resolved)
    }
}
