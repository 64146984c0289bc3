//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查与服务横幅
//! - [`users`] - 用户目录接口 (注册、角色、校验)
//! - [`issues`] - Issue 生命周期接口 (CRUD、搜索、点赞、驳回、指派)
//! - [`payments`] - 支付记录接口 (订阅、priority boost)

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod convert;
pub mod middleware;

pub mod health;
pub mod issues;
pub mod payments;
pub mod users;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(users::router())
        .merge(issues::router())
        .merge(payments::router())
}

/// Build a fully configured application with all middleware
pub fn build_app(_state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging - outermost, executed first
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
}
