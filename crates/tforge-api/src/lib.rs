//! Axum HTTP API server.
//!
//! This crate provides:
//! - Job submission and status polling
//! - A WebSocket channel streaming every job's progress lines
//! - Trend source administration
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod relay;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::{ApiConfig, QueueBackend};
pub use error::{ApiError, ApiResult};
pub use relay::relay_progress;
pub use routes::create_router;
pub use state::AppState;
