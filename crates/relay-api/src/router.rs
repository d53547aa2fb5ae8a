//! Route definitions for the relay.
//!
//! `/` serves the page (or upgrades), `/ws` always upgrades, `/api/health`
//! reports status, and anything else upgrades or returns 404.

use axum::{
    Router,
    routing::{any, get},
};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all routes.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route("/health", get(handlers::health::health));

    Router::new()
        .route("/", any(handlers::static_page::index))
        .route("/index.html", any(handlers::static_page::index))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .nest("/api", api_routes)
        .fallback(handlers::static_page::fallback)
        .with_state(state)
}
