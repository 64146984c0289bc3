//! Unified Error Handling
//!
//! The server uses the shared [`shared::error::ApiError`] everywhere; this
//! module re-exports it under the application-local name.

pub use shared::error::ApiError as AppError;
