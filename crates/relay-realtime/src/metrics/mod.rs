//! Hub metrics.
//!
//! Counters are informational; nothing in the hub branches on them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Hub-level metrics counters.
#[derive(Debug)]
pub struct RealtimeMetrics {
    /// Connections registered since start
    pub connections_opened: AtomicU64,
    /// Connections deregistered since start
    pub connections_closed: AtomicU64,
    /// Handshakes refused at capacity
    pub connections_rejected: AtomicU64,
    /// Text messages received from clients
    pub messages_received: AtomicU64,
    /// Messages handed to recipient queues
    pub messages_delivered: AtomicU64,
    /// Per-recipient sends that failed or timed out
    pub delivery_failures: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            messages_delivered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one fan-out.
    pub fn fanout(&self, delivered: u64, failed: u64) {
        self.messages_delivered.fetch_add(delivered, Ordering::Relaxed);
        self.delivery_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for RealtimeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections registered since start
    pub connections_opened: u64,
    /// Connections deregistered since start
    pub connections_closed: u64,
    /// Handshakes refused at capacity
    pub connections_rejected: u64,
    /// Text messages received from clients
    pub messages_received: u64,
    /// Messages handed to recipient queues
    pub messages_delivered: u64,
    /// Per-recipient sends that failed or timed out
    pub delivery_failures: u64,
}
