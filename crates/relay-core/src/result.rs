//! Convenience result type alias for the relay.

use crate::error::AppError;

/// A specialized `Result` type for relay operations.
///
/// Saves every crate from spelling out `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
