//! Inbound and outbound relay message types.

pub mod types;

pub use types::{InboundMessage, OutboundMessage};
