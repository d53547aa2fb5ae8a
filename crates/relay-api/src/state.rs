//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use relay_core::config::AppConfig;
use relay_realtime::server::RealtimeEngine;

use crate::handlers::static_page::StaticPage;

/// Shared application state passed to all Axum handlers via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Real-time engine (broadcast hub, metrics, shutdown).
    pub realtime: Arc<RealtimeEngine>,
    /// Document served on `/`.
    pub page: StaticPage,
}

impl AppState {
    /// Builds the state and the real-time engine it owns.
    pub fn new(config: AppConfig, page: StaticPage) -> Self {
        let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
        Self {
            config: Arc::new(config),
            realtime,
            page,
        }
    }
}
