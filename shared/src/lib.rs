//! Shared types for the citizen issue-reporting backend
//!
//! Common types used by the server and any future clients: the unified
//! response envelope, error types, and the normalized role/status/priority
//! enums.

pub mod error;
pub mod response;
pub mod types;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiError, ApiResult};
pub use response::{ApiResponse, Pagination};
pub use types::{IssueStatus, Priority, Role};
