//! # relay-realtime
//!
//! Real-time WebSocket core of the echo relay. Provides:
//!
//! - A capacity-bounded registry of live connections
//! - A broadcast hub that echoes every inbound message to all connections,
//!   with a per-recipient send timeout
//! - Hub metrics and an engine that closes everything on shutdown
//!
//! Socket handling lives in `relay-api`; this crate only sees outbound
//! queues and close signals.

pub mod connection;
pub mod error;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod server;

pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::registry::ConnectionRegistry;
pub use error::RealtimeError;
pub use hub::{BroadcastHub, DeliveryReport};
pub use message::types::{InboundMessage, OutboundMessage};
pub use metrics::{MetricsSnapshot, RealtimeMetrics};
pub use server::RealtimeEngine;
