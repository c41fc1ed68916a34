//! Shared HTTP API primitives
//!
//! Framework-free pieces of request authentication. The axum middleware in
//! `remainders-api` wraps these.

pub mod auth;

pub use auth::{
    request_hash, to_canonical_json, verify_hash, verify_timestamp, ApiAuthError, SignedQuery,
};
