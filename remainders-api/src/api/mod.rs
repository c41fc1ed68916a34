//! HTTP API handlers for remainders-api

pub mod auth;
pub mod health;
pub mod remainders;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use remainders::{get_latest, get_search};
