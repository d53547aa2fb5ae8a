//! Route handlers.

pub mod health;
pub mod static_page;
pub mod ws;
