//! Users API Handlers
//!
//! The directory is keyed by email. Signup is idempotent: re-signup with an
//! existing email returns the stored record unchanged.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::convert::UserView;
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{MAX_EMAIL_LEN, MAX_NAME_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::{ApiResponse, Role};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListData {
    pub count: usize,
    pub users: Vec<UserView>,
}

/// POST /api/users - 注册 (幂等)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("Email is required"))?;
    validate_required_text(&email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.display_name, "displayName", MAX_NAME_LEN)?;

    let repo = UserRepository::new(state.get_db());

    if let Some(existing) = repo.find_by_email(&email).await? {
        return Ok(Json(ApiResponse::ok_with_message(
            existing.into(),
            "User already exists",
        )));
    }

    let now = Utc::now();
    let user = User {
        id: None,
        email,
        display_name: payload.display_name,
        photo_url: payload.photo_url,
        role: payload.role.unwrap_or_default(),
        uid: payload.uid,
        is_premium: false,
        premium_since: None,
        premium_until: None,
        created_at: now,
        updated_at: Some(now),
    };

    let created = repo.create(user).await?;
    Ok(Json(ApiResponse::ok_with_message(
        created.into(),
        "User created successfully",
    )))
}

/// GET /api/users - 获取所有用户
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<UserListData>>> {
    let repo = UserRepository::new(state.get_db());
    let users = repo.find_all().await?;
    let data = UserListData {
        count: users.len(),
        users: users.into_iter().map(UserView::from).collect(),
    };
    Ok(Json(ApiResponse::ok(data)))
}

/// GET /api/users/{email} - 按邮箱获取用户
pub async fn get_by_email(
    State(state): State<ServerState>,
    Path(email): Path<String>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PATCH /api/users/{email} - 更新用户资料
pub async fn update(
    State(state): State<ServerState>,
    Path(email): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    validate_optional_text(&payload.display_name, "displayName", MAX_NAME_LEN)?;

    let repo = UserRepository::new(state.get_db());
    let updated = repo.update(&email, payload).await?;
    Ok(Json(ApiResponse::ok_with_message(
        updated.into(),
        "User updated successfully",
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedUser {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateData {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ValidatedUser>,
}

/// POST /api/users/validate - 校验客户端声称的身份
///
/// uid 是可选的二次校验：与存储的 uid 不一致时返回 `valid: false`，
/// 而不是错误 (客户端据此强制重新登录)。
pub async fn validate(
    State(state): State<ServerState>,
    Json(payload): Json<ValidateRequest>,
) -> AppResult<Json<ApiResponse<ValidateData>>> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::validation("Email is required"))?;

    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if let (Some(claimed), Some(stored)) = (&payload.uid, &user.uid)
        && claimed != stored
    {
        tracing::warn!(email, "uid mismatch during validation");
        return Ok(Json(ApiResponse::ok_with_message(
            ValidateData {
                valid: false,
                user: None,
            },
            "User session invalid",
        )));
    }

    Ok(Json(ApiResponse::ok(ValidateData {
        valid: true,
        user: Some(ValidatedUser {
            email: user.email,
            role: user.role,
            display_name: user.display_name,
        }),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// POST /api/users/role - 更新用户角色
pub async fn update_role(
    State(state): State<ServerState>,
    Json(payload): Json<RoleUpdateRequest>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let (email, role_raw) = match (payload.email.as_deref(), payload.role.as_deref()) {
        (Some(email), Some(role)) if !email.is_empty() && !role.is_empty() => (email, role),
        _ => return Err(AppError::validation("Email and role are required")),
    };
    let role = Role::parse(role_raw);

    let repo = UserRepository::new(state.get_db());
    let updated = repo.update_role(email, role).await?;
    tracing::info!(email, role = %role, "user role updated");

    Ok(Json(ApiResponse::ok_with_message(
        updated.into(),
        format!("Role updated to {role} for {email}"),
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// GET /api/users/role/{email} - 查询用户角色
pub async fn check_role(
    State(state): State<ServerState>,
    Path(email): Path<String>,
) -> AppResult<Json<ApiResponse<RoleInfo>>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(ApiResponse::ok(RoleInfo {
        email: user.email,
        role: user.role,
        display_name: user.display_name,
        created_at: user.created_at,
    })))
}
