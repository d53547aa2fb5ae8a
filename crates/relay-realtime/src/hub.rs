//! Broadcast hub: connection lifecycle and echo-to-all fan-out.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relay_core::config::RealtimeConfig;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::ConnectionRegistry;
use crate::error::RealtimeError;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::RealtimeMetrics;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients whose queue accepted the message.
    pub delivered: usize,
    /// Recipients dropped because the send failed or timed out.
    pub failed: usize,
}

/// Routes every inbound message to every registered connection.
#[derive(Debug)]
pub struct BroadcastHub {
    /// Live connections.
    registry: Arc<ConnectionRegistry>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Greeting for new connections.
    welcome: Arc<str>,
    /// Cancelled once the relay starts shutting down.
    closing: CancellationToken,
    /// Configuration.
    config: RealtimeConfig,
}

impl BroadcastHub {
    /// Creates a hub with an empty registry sized from `config`.
    ///
    /// Once `closing` is cancelled the hub admits no further connections.
    pub fn new(
        config: RealtimeConfig,
        metrics: Arc<RealtimeMetrics>,
        closing: CancellationToken,
    ) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(config.max_connections)),
            metrics,
            welcome: Arc::from(config.welcome_message.as_str()),
            closing,
            config,
        }
    }

    /// Admits a connection whose handshake just completed.
    ///
    /// The welcome message is queued before the connection becomes visible
    /// to broadcasts, so it is always the first frame the client sees.
    /// Returns the handle plus the receiver the session task drains into
    /// the socket.
    ///
    /// Refused once shutdown has started, including when shutdown begins
    /// while this call is registering.
    pub fn on_connect(
        &self,
    ) -> Result<(Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>), RealtimeError> {
        if self.closing.is_cancelled() {
            self.metrics.connection_rejected();
            return Err(RealtimeError::shutting_down());
        }

        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size);
        tx.try_send(OutboundMessage::Welcome(Arc::clone(&self.welcome)))
            .map_err(|_| RealtimeError::HandshakeRejected {
                reason: "outbound queue has no room for the welcome message".to_string(),
                source: None,
            })?;

        let handle = match self.registry.register(tx) {
            Ok(handle) => handle,
            Err(e) => {
                self.metrics.connection_rejected();
                warn!(
                    capacity = self.registry.capacity(),
                    error = %e,
                    "Refusing WebSocket connection"
                );
                return Err(RealtimeError::handshake_rejected(e));
            }
        };

        // Shutdown cancels before it drains, so a registration that raced
        // the drain is caught here.
        if self.closing.is_cancelled() {
            self.registry.deregister(&handle.id);
            self.metrics.connection_rejected();
            return Err(RealtimeError::shutting_down());
        }

        self.metrics.connection_opened();
        info!(
            conn_id = %handle.id,
            connections = self.registry.count(),
            "WebSocket connection registered"
        );

        Ok((handle, rx))
    }

    /// Relays `payload` from `origin` to every registered connection,
    /// `origin` included.
    ///
    /// Recipients are served concurrently; each gets at most the configured
    /// send timeout. Any recipient that fails is deregistered and the rest
    /// of the broadcast carries on. Messages from connections that are no
    /// longer registered are dropped.
    pub async fn on_message(
        &self,
        origin: ConnectionId,
        payload: impl Into<String>,
    ) -> DeliveryReport {
        if !self.registry.contains(&origin) {
            debug!(conn_id = %origin, "Dropping message from unregistered connection");
            return DeliveryReport::default();
        }

        let inbound = InboundMessage::new(origin, payload);
        self.metrics.message_received();
        debug!(
            conn_id = %inbound.origin,
            len = inbound.payload.len(),
            "Message received"
        );

        let outbound = OutboundMessage::echo(&inbound);
        let timeout = self.config.send_timeout();
        let recipients = self.registry.snapshot();

        let results = join_all(recipients.iter().map(|conn| {
            let msg = outbound.clone();
            async move { (conn.id, conn.send(msg, timeout).await) }
        }))
        .await;

        let mut report = DeliveryReport::default();
        for (conn_id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    self.on_error(conn_id, &e);
                }
            }
        }

        self.metrics.fanout(report.delivered as u64, report.failed as u64);
        report
    }

    /// Deregisters a connection that closed. Returns `false` if it was
    /// already gone.
    pub fn on_disconnect(&self, conn_id: ConnectionId) -> bool {
        match self.registry.deregister(&conn_id) {
            Some(handle) => {
                self.metrics.connection_closed();
                info!(
                    conn_id = %conn_id,
                    connected_secs = (Utc::now() - handle.connected_at).num_seconds(),
                    connections = self.registry.count(),
                    "WebSocket connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Deregisters a connection after a read or write failure.
    pub fn on_error(&self, conn_id: ConnectionId, cause: &RealtimeError) -> bool {
        if self.registry.contains(&conn_id) {
            warn!(conn_id = %conn_id, error = %cause, "Dropping failed connection");
        }
        self.on_disconnect(conn_id)
    }

    /// Closes every registered connection.
    pub fn close_all(&self) -> usize {
        let closed = self.registry.drain();
        for _ in &closed {
            self.metrics.connection_closed();
        }
        info!(count = closed.len(), "All connections closed");
        closed.len()
    }

    /// Whether another connection would currently be admitted.
    pub fn has_capacity(&self) -> bool {
        self.registry.has_capacity()
    }

    /// Returns the registered connection count.
    pub fn connection_count(&self) -> usize {
        self.registry.count()
    }

    /// Returns a reference to the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the hub configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}
