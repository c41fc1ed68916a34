//! Remainder endpoints
//!
//! - GET /api/v1/latest: resolved recipients of the 25 newest remainders
//! - GET /api/v1/search/:filter: resolved recipients matching a search phrase

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use remainders_common::{Error, ResolvedRecord};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;

/// GET /api/v1/latest
pub async fn get_latest(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResolvedRecord>>, ApiError> {
    let records = state.pipeline.resolve_latest().await?;
    Ok(Json(records))
}

/// GET /api/v1/search/:filter
///
/// The filter is sanitized before use; one that sanitizes to nothing is a
/// 400, never "match everything".
pub async fn get_search(
    State(state): State<AppState>,
    Path(filter): Path<String>,
) -> Result<Json<Vec<ResolvedRecord>>, ApiError> {
    let records = state.pipeline.resolve_search(&filter).await?;
    Ok(Json(records))
}

/// Pipeline error mapped to an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::SanitizationEmpty => StatusCode::BAD_REQUEST,
            Error::MalformedRecipientSegment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() || status == StatusCode::UNPROCESSABLE_ENTITY {
            error!("Request failed: {}", self.0);
        } else {
            info!("Rejected request: {}", self.0);
        }

        let message = match &self.0 {
            // the segment stays in the log; clients only learn the record was bad
            Error::MalformedRecipientSegment { record, .. } => {
                format!("Malformed recipient data in record {}", record)
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
