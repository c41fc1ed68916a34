//! remainders-api library
//!
//! Read-only HTTP API over resolved remainders.

use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderValue, Method};
use axum::Router;
use remainders_common::config::{TomlConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use remainders_common::ResultPipeline;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug_span, Span};

pub mod api;
pub mod logging;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Fetch + fan-out + filter pipeline
    pub pipeline: ResultPipeline,
    /// Shared secret for API authentication (0 = disabled)
    pub shared_secret: i64,
}

impl AppState {
    /// Create new application state
    pub fn new(pipeline: ResultPipeline, shared_secret: i64) -> Self {
        Self {
            pipeline,
            shared_secret,
        }
    }
}

/// Transport-level settings for the router
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// CORS origins; empty means no cross-origin access
    pub allowed_origins: Vec<HeaderValue>,
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HttpOptions {
    pub fn from_config(config: &TomlConfig) -> anyhow::Result<Self> {
        let allowed_origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", origin, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            allowed_origins,
            request_timeout: config.request_timeout(),
        })
    }
}

/// Build application router
///
/// Health endpoints are public; everything under `/api/v1` requires a
/// signed request.
pub fn build_router(state: AppState, options: &HttpOptions) -> Router {
    use axum::middleware;
    use axum::routing::get;

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/v1/latest", get(api::get_latest))
        .route("/api/v1/search/:filter", get(api::get_search))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = api::health_routes();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(options.allowed_origins.clone()))
        .allow_methods([Method::GET]);

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span carrying the method and route template, not the URI
fn request_span(request: &Request) -> Span {
    debug_span!(
        "request",
        method = %request.method(),
        route = api::auth::route(request),
    )
}
