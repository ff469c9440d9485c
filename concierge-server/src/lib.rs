//! `concierge-server` exposes the resort concierge over HTTP.
//! One JSON endpoint answers guest questions; `GET /` is a health check.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, DEFAULT_SERVICE_NAME, ServerConfig, app_router, init_tracing, run_server};
