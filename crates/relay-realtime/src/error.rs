//! Error type for the broadcast hub.
//!
//! Per-connection failures ([`RealtimeError::SendFailure`],
//! [`RealtimeError::ReadFailure`], [`RealtimeError::PeerClosed`]) are
//! absorbed by deregistering the connection. Only handshake rejections
//! travel back to the transport layer.

use relay_core::error::AppError;
use thiserror::Error;

use crate::connection::handle::ConnectionId;

/// Errors raised while admitting, reading from, or writing to connections.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The registry already holds the maximum number of connections.
    #[error("Connection registry at capacity ({capacity})")]
    CapacityExceeded {
        /// Configured maximum.
        capacity: usize,
    },

    /// The handshake was refused before the connection was registered.
    #[error("Handshake rejected: {reason}")]
    HandshakeRejected {
        /// Why the handshake was refused.
        reason: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<RealtimeError>>,
    },

    /// A message could not be handed to a recipient.
    #[error("Send to connection {conn_id} failed: {reason}")]
    SendFailure {
        /// Recipient.
        conn_id: ConnectionId,
        /// What went wrong.
        reason: String,
    },

    /// Reading from the peer failed.
    #[error("Read from connection {conn_id} failed: {reason}")]
    ReadFailure {
        /// Connection that failed.
        conn_id: ConnectionId,
        /// Transport error text.
        reason: String,
    },

    /// The peer closed the connection.
    #[error("Connection {conn_id} closed by peer")]
    PeerClosed {
        /// Connection that closed.
        conn_id: ConnectionId,
    },
}

impl RealtimeError {
    /// Wrap `cause` as a handshake rejection.
    pub fn handshake_rejected(cause: RealtimeError) -> Self {
        Self::HandshakeRejected {
            reason: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// Handshake refused because the relay is stopping.
    pub fn shutting_down() -> Self {
        Self::HandshakeRejected {
            reason: "server shutting down".to_string(),
            source: None,
        }
    }

    /// Whether this error was caused by the registry being full.
    pub fn is_capacity(&self) -> bool {
        match self {
            Self::CapacityExceeded { .. } => true,
            Self::HandshakeRejected {
                source: Some(cause),
                ..
            } => cause.is_capacity(),
            _ => false,
        }
    }
}

impl From<RealtimeError> for AppError {
    fn from(err: RealtimeError) -> Self {
        match &err {
            RealtimeError::CapacityExceeded { .. } | RealtimeError::HandshakeRejected { .. } => {
                AppError::service_unavailable(err.to_string())
            }
            _ => AppError::connection(err.to_string()),
        }
    }
}
