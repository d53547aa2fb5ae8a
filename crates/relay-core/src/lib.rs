//! # relay-core
//!
//! Core crate for the echo relay. Contains configuration schemas,
//! the unified error system, and the shared result alias.
//!
//! This crate has **no** internal dependencies on other relay crates.

pub mod config;
pub mod error;
pub mod result;

pub use config::AppConfig;
pub use error::AppError;
pub use result::AppResult;
