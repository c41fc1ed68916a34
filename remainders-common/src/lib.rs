//! # Remainders Common Library
//!
//! Shared code for the remainders service:
//! - Stored and resolved record models
//! - Recipient resolution and message fan-out engine
//! - Search phrase sanitization
//! - Record sources (SQLite, in-memory) and the result pipeline
//! - Configuration loading
//! - API authentication primitives

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod resolve;
pub mod search;
pub mod source;

pub use error::{Error, Result};
pub use models::{ResolvedRecord, StoredRecord};
pub use pipeline::ResultPipeline;
pub use resolve::FanoutEngine;
pub use search::SearchPhrase;
