//! Health API Handlers

use axum::Json;
use serde_json::{Value, json};

/// GET / - 服务横幅和接口一览
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Public Infrastructure Report Server is running 🚀",
        "endpoints": {
            "health": "GET /health",
            "users": "POST /api/users, GET /api/users, GET /api/users/{email}, PATCH /api/users/{email}",
            "validateUser": "POST /api/users/validate",
            "roles": "POST /api/users/role, GET /api/users/role/{email}",
            "issues": "GET /api/issues, POST /api/issues, GET /api/issues/{id}, PATCH /api/issues/{id}, DELETE /api/issues/{id}",
            "myIssues": "GET /api/issues/mine?email=user@example.com",
            "issueActions": "POST /api/issues/{id}/upvote, POST /api/issues/{id}/assign, POST /api/issues/{id}/reject, POST /api/issues/{id}/undo-reject, PATCH /api/issues/{id}/status",
            "stats": "GET /api/issues/stats",
            "payments": "POST /api/payments, POST /api/payments/boost, GET /api/payments/user/{email}",
        }
    }))
}

/// GET /health - 存活检查
pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": shared::util::now_rfc3339(),
    }))
}
