//! Authentication middleware
//!
//! Protected routes take `timestamp` and `hash` query parameters, validated
//! with the shared-secret scheme from `remainders_common::api::auth`.

use std::collections::HashMap;

use axum::{
    extract::{MatchedPath, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use remainders_common::api::{ApiAuthError, SignedQuery};
use serde_json::json;
use tracing::{debug, warn};

use crate::AppState;

/// Authentication middleware
///
/// Returns 401 for a stale timestamp or wrong hash and 400 when the auth
/// parameters are missing or unparseable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // secret = 0 disables all auth checking
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let signed = signed_query(&request)?;

    signed.verify(state.shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => {
            debug!("Rejected request timestamp: {}", reason);
            AuthError::InvalidTimestamp(reason)
        }
        ApiAuthError::InvalidHash { .. } => {
            warn!("Hash validation failed for {}", route(&request));
            AuthError::InvalidHash
        }
        ApiAuthError::MissingTimestamp | ApiAuthError::MissingHash => {
            AuthError::MissingFields(e.to_string())
        }
    })?;

    Ok(next.run(request).await)
}

/// Route template of the request
///
/// Raw paths carry unsanitized search phrases and never reach the log.
pub fn route(request: &Request) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("<unmatched>")
}

/// Pull `timestamp` and `hash` out of the query string
fn signed_query(request: &Request) -> Result<SignedQuery, AuthError> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map_err(|e| AuthError::ParseError(e.to_string()))?;

    let timestamp = params
        .get("timestamp")
        .ok_or_else(|| AuthError::MissingFields(ApiAuthError::MissingTimestamp.to_string()))?
        .parse::<i64>()
        .map_err(|e| AuthError::ParseError(format!("timestamp: {}", e)))?;

    let hash = params
        .get("hash")
        .ok_or_else(|| AuthError::MissingFields(ApiAuthError::MissingHash.to_string()))?
        .clone();

    Ok(SignedQuery { timestamp, hash })
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidTimestamp(reason) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid timestamp: {}", reason))
            }
            AuthError::InvalidHash => (StatusCode::UNAUTHORIZED, "Invalid hash".to_string()),
            AuthError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, format!("Missing required fields: {}", msg))
            }
            AuthError::ParseError(msg) => {
                (StatusCode::BAD_REQUEST, format!("Parse error: {}", msg))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
