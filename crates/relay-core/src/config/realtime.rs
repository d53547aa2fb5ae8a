//! Real-time WebSocket hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum simultaneously registered connections. Handshakes beyond
    /// this are rejected.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Per-connection outbound queue size.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Upper bound in milliseconds for handing one message to one recipient.
    /// A recipient that misses it is dropped.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
    /// Text sent once to every new connection.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

impl RealtimeConfig {
    /// Per-recipient send timeout as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            outbound_buffer_size: default_outbound_buffer(),
            send_timeout_ms: default_send_timeout(),
            welcome_message: default_welcome_message(),
        }
    }
}

fn default_max_connections() -> usize {
    10_000
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_send_timeout() -> u64 {
    5000
}

fn default_welcome_message() -> String {
    "Chào từ server WebSocket!".to_string()
}
