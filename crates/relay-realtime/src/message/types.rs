//! Inbound and outbound WebSocket message type definitions.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::connection::handle::ConnectionId;

/// Prefix put in front of every relayed payload.
pub const ECHO_PREFIX: &str = "Echo: ";

/// A text message received from a client.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Connection the message arrived on.
    pub origin: ConnectionId,
    /// Raw text payload.
    pub payload: String,
    /// When the relay received it.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    /// Tag `payload` with the connection it came from.
    pub fn new(origin: ConnectionId, payload: impl Into<String>) -> Self {
        Self {
            origin,
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

/// Text frames sent by the server to a client.
///
/// The text is reference counted so one broadcast renders it once and
/// shares it between all recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Greeting sent once to a newly connected client.
    Welcome(Arc<str>),
    /// A relayed client message, already prefixed with [`ECHO_PREFIX`].
    Echo(Arc<str>),
}

impl OutboundMessage {
    /// Render the echo of `inbound`.
    pub fn echo(inbound: &InboundMessage) -> Self {
        Self::Echo(Arc::from(format!("{ECHO_PREFIX}{}", inbound.payload)))
    }

    /// The frame text as it goes on the wire.
    pub fn text(&self) -> &str {
        match self {
            Self::Welcome(text) | Self::Echo(text) => text,
        }
    }
}
