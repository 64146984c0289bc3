//! API Response types
//!
//! Standardized API response structures for the entire system

use serde::{Deserialize, Serialize};

/// Unified API response structure
///
/// All API responses follow this format:
/// ```json
/// {
///     "success": true,
///     "message": "Issue submitted successfully",
///     "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Internal error detail (development builds only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    /// Create a successful response with custom message
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    /// Create a successful response carrying only a message
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// Create an error response with internal detail attached
    pub fn error_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: Some(detail.into()),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub limit: u32,
    /// Total number of matched items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_up_partial_pages() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], 42);
        assert!(body.get("message").is_none());
        assert!(body.get("error").is_none());
    }
}
