//! # relay-api
//!
//! HTTP layer for the echo relay built on Axum.
//!
//! Provides the WebSocket upgrade and per-connection session pump, the
//! static page responder, the health endpoint, middleware (logging, CORS),
//! and error mapping.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, serve};
pub use state::AppState;
