//! Individual WebSocket connection handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::RealtimeError;
use crate::message::types::OutboundMessage;

/// Unique connection identifier.
///
/// Assigned by the registry from a monotonically increasing counter and
/// never reused, so ordering by id is ordering by registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw identifier value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw identifier value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender half of the connection's outbound queue. The session
/// task that owns the socket drains the receiver half and watches
/// [`ConnectionHandle::closed`] to know when to tear the socket down.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Sender for outbound messages
    sender: mpsc::Sender<OutboundMessage>,
    /// Whether the connection is still eligible for delivery
    alive: AtomicBool,
    /// Fired once when the connection is closed for any reason
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(id: ConnectionId, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            connected_at: Utc::now(),
            sender,
            alive: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    /// Queue an outbound message, waiting at most `timeout` for room.
    ///
    /// Gives up early if the connection is closed while waiting.
    pub async fn send(&self, msg: OutboundMessage, timeout: Duration) -> Result<(), RealtimeError> {
        if !self.is_alive() {
            return Err(self.send_failure("connection closed"));
        }

        tokio::select! {
            _ = self.closed.cancelled() => Err(self.send_failure("connection closed")),
            sent = time::timeout(timeout, self.sender.send(msg)) => match sent {
                Ok(Ok(())) => Ok(()),
                Ok(Err(_)) => {
                    self.mark_closed();
                    Err(self.send_failure("outbound queue closed"))
                }
                Err(_) => Err(self.send_failure(&format!(
                    "recipient did not accept message within {}ms",
                    timeout.as_millis()
                ))),
            },
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection closed and wake its session task.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.closed.cancel();
    }

    /// Token cancelled when the connection is closed.
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    fn send_failure(&self, reason: &str) -> RealtimeError {
        RealtimeError::SendFailure {
            conn_id: self.id,
            reason: reason.to_string(),
        }
    }
}
