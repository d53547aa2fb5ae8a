//! Top-level real-time engine that owns the hub and coordinates shutdown.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::info;

use relay_core::config::RealtimeConfig;

use crate::hub::BroadcastHub;
use crate::metrics::RealtimeMetrics;

/// Central real-time engine shared by every request handler.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Broadcast hub.
    pub hub: Arc<BroadcastHub>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    /// Cancelled when the engine shuts down.
    shutdown: CancellationToken,
    /// When the engine was created.
    started_at: Instant,
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: RealtimeConfig) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let shutdown = CancellationToken::new();
        let hub = Arc::new(BroadcastHub::new(
            config,
            Arc::clone(&metrics),
            shutdown.clone(),
        ));

        info!(
            max_connections = hub.config().max_connections,
            send_timeout_ms = hub.config().send_timeout_ms,
            "Real-time engine initialized"
        );

        Self {
            hub,
            metrics,
            shutdown,
            started_at: Instant::now(),
        }
    }

    /// Token cancelled once [`RealtimeEngine::shutdown`] runs.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Whether shutdown has started.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Seconds since the engine was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Stops admitting connections and closes every registered one.
    ///
    /// Broadcasts still in flight are abandoned. Safe to call repeatedly;
    /// each call drains whatever is still registered.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Shutting down real-time engine");
            self.shutdown.cancel();
        }
        let closed = self.hub.close_all();
        info!(closed, "Real-time engine shut down");
    }
}
