//! Issues API Handlers
//!
//! Mutating endpoints resolve the acting user (when one is supplied) and
//! consult the permission resolver before handing the snapshot to the
//! lifecycle engine. Persistence is last-writer-wins; the upvote toggle is
//! the only store-side atomic operation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::convert::IssueView;
use crate::core::ServerState;
use crate::db::models::{AssignedStaff, Issue, IssueCreate, IssueUpdate, TimelineEntry};
use crate::db::repository::{
    IssueRepository, SearchParams, SortDirection, SortKey, UserRepository, new_key,
};
use crate::identity::resolve_acting_user;
use crate::issues::{lifecycle, permissions, upvote};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::{ApiResponse, IssueStatus, Pagination, Priority};

// ========== Request / response shapes ==========

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    /// Acting user identifier (email or opaque id). Absent means the legacy
    /// unrestricted path, when enabled.
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailQuery {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQueryParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueListData {
    pub count: usize,
    pub issues: Vec<IssueView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFilters {
    pub categories: Vec<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub sort: String,
    pub order: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSearchData {
    pub count: usize,
    pub issues: Vec<IssueView>,
    pub pagination: Pagination,
    pub available_filters: AvailableFilters,
    pub applied_filters: AppliedFilters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub total: u64,
    pub pending: u64,
    pub assigned: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteData {
    pub upvotes: i64,
    pub has_upvoted: bool,
}

// ========== CRUD ==========

/// POST /api/issues - 提交新 issue
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<IssueCreate>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    let missing: Vec<&str> = [
        ("title", &payload.title),
        ("description", &payload.description),
        ("category", &payload.category),
        ("location", &payload.location),
    ]
    .iter()
    .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
    .map(|(name, _)| *name)
    .collect();
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let title = payload.title.unwrap_or_default();
    let description = payload.description.unwrap_or_default();
    let category = payload.category.unwrap_or_default();
    let location = payload.location.unwrap_or_default();
    validate_required_text(&title, "title", MAX_NAME_LEN)?;
    validate_required_text(&description, "description", MAX_TEXT_LEN)?;
    validate_required_text(&category, "category", MAX_NAME_LEN)?;
    validate_required_text(&location, "location", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;

    let now = Utc::now();
    let reported_by = payload
        .reported_by
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "User".to_string());
    let status = payload.status.unwrap_or_default();
    let images = payload.images.unwrap_or_default();
    let image = payload.image.or_else(|| images.first().cloned());

    let issue = Issue {
        id: None,
        title,
        description,
        category,
        location,
        reported_by: reported_by.clone(),
        user_email: payload.user_email.unwrap_or_default(),
        user_id: payload.user_id,
        status,
        priority: payload.priority.unwrap_or_default(),
        progress: 0,
        image,
        images,
        upvotes: 0,
        upvoted_by: vec![],
        assigned_to: None,
        comments: vec![],
        timeline: vec![TimelineEntry {
            status,
            message: "Issue reported by citizen".to_string(),
            updated_by: reported_by,
            updated_at: now,
        }],
        reported_at: now,
        updated_at: None,
        resolved_at: None,
        rejection_reason: None,
        rejected_at: None,
        rejected_by: None,
        latitude: payload.latitude,
        longitude: payload.longitude,
    };

    let key = payload.id.unwrap_or_else(new_key);
    let repo = IssueRepository::new(state.get_db());
    let created = repo.create(&key, issue).await?;

    Ok(Json(ApiResponse::ok_with_message(
        created.into(),
        "Issue submitted successfully",
    )))
}

/// GET /api/issues - 搜索/过滤/分页
///
/// Without parameters this is the plain listing: page 1, newest first.
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<SearchQueryParams>,
) -> AppResult<Json<ApiResponse<IssueSearchData>>> {
    let status = params
        .status
        .as_deref()
        .map(|raw| {
            IssueStatus::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Unknown status filter: {raw}")))
        })
        .transpose()?;
    let priority = params
        .priority
        .as_deref()
        .map(|raw| {
            Priority::parse_strict(raw)
                .ok_or_else(|| AppError::validation(format!("Unknown priority filter: {raw}")))
        })
        .transpose()?;
    let sort = params
        .sort
        .as_deref()
        .map(|raw| {
            SortKey::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Unknown sort key: {raw}")))
        })
        .transpose()?
        .unwrap_or(SortKey::Recent);
    let direction = params
        .order
        .as_deref()
        .map(|raw| {
            SortDirection::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Unknown sort order: {raw}")))
        })
        .transpose()?
        .unwrap_or_else(|| sort.default_direction());

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let search = SearchParams {
        text: params.q.clone().filter(|q| !q.trim().is_empty()),
        category: params.category.clone().filter(|c| !c.is_empty()),
        status,
        priority,
        location: params.location.clone().filter(|l| !l.is_empty()),
        sort,
        direction,
        page,
        limit,
    };

    let repo = IssueRepository::new(state.get_db());
    let result = repo.search(&search).await?;

    let data = IssueSearchData {
        count: result.issues.len(),
        issues: result.issues.into_iter().map(IssueView::from).collect(),
        pagination: Pagination::new(page, limit, result.total),
        available_filters: AvailableFilters {
            categories: result.categories,
            statuses: result.statuses,
            priorities: result.priorities,
            locations: result.locations,
        },
        applied_filters: AppliedFilters {
            q: search.text,
            category: search.category,
            status,
            priority,
            location: search.location,
            sort: sort.as_str().to_string(),
            order: match direction {
                SortDirection::Asc => "asc".to_string(),
                SortDirection::Desc => "desc".to_string(),
            },
        },
    };
    Ok(Json(ApiResponse::ok(data)))
}

/// GET /api/issues/{id} - 获取单个 issue
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    let repo = IssueRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    Ok(Json(ApiResponse::ok(issue.into())))
}

/// PATCH /api/issues/{id} - 更新 issue (role-scoped 或 legacy)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<ActorQuery>,
    Json(raw): Json<IssueUpdate>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    validate_optional_text(&raw.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&raw.description, "description", MAX_TEXT_LEN)?;
    validate_optional_text(&raw.location, "location", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&raw.image, "image", MAX_URL_LEN)?;
    if let Some(progress) = raw.progress
        && progress > 100
    {
        return Err(AppError::validation("progress must be between 0 and 100"));
    }

    let repo = IssueRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;

    let updated = match &query.actor {
        Some(ident) => {
            let users = UserRepository::new(state.get_db());
            let actor = resolve_acting_user(&users, ident).await?;
            lifecycle::apply_update(
                &issue,
                &raw,
                lifecycle::UpdateMode::RoleScoped(&actor),
                Utc::now(),
            )?
        }
        None if state.config.allow_legacy_updates => lifecycle::apply_update(
            &issue,
            &raw,
            lifecycle::UpdateMode::LegacyUnrestricted,
            Utc::now(),
        )?,
        None => {
            return Err(AppError::invalid(
                "Acting user is required: unrestricted updates are disabled",
            ));
        }
    };

    let saved = repo.save(&id, updated).await?;
    Ok(Json(ApiResponse::ok_with_message(
        saved.into(),
        "Issue updated successfully",
    )))
}

/// DELETE /api/issues/{id} - 删除 issue
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<ActorQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    let repo = IssueRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;

    match &query.actor {
        Some(ident) => {
            let users = UserRepository::new(state.get_db());
            let actor = resolve_acting_user(&users, ident).await?;
            let perms = permissions::resolve(&issue, &actor);
            if !perms.can_delete {
                return Err(AppError::forbidden(
                    "You do not have permission to delete this issue",
                ));
            }
        }
        None if state.config.allow_legacy_updates => {}
        None => {
            return Err(AppError::invalid(
                "Acting user is required: unrestricted deletes are disabled",
            ));
        }
    }

    if !repo.delete(&id).await? {
        return Err(AppError::not_found("Issue"));
    }
    Ok(Json(ApiResponse::message_only("Issue deleted successfully")))
}

// ========== Queries ==========

/// GET /api/issues/mine?email= - 当前用户提交的 issues
pub async fn mine(
    State(state): State<ServerState>,
    Query(query): Query<EmailQuery>,
) -> AppResult<Json<ApiResponse<IssueListData>>> {
    let email = query
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::validation("Email query parameter is required"))?;
    find_reported_by(&state, email).await
}

/// GET /api/issues/user/{email} - 指定用户提交的 issues
pub async fn by_user(
    State(state): State<ServerState>,
    Path(email): Path<String>,
) -> AppResult<Json<ApiResponse<IssueListData>>> {
    find_reported_by(&state, &email).await
}

async fn find_reported_by(
    state: &ServerState,
    ident: &str,
) -> AppResult<Json<ApiResponse<IssueListData>>> {
    let repo = IssueRepository::new(state.get_db());
    let issues = repo.find_by_reporter(ident).await?;
    let data = IssueListData {
        count: issues.len(),
        issues: issues.into_iter().map(IssueView::from).collect(),
    };
    Ok(Json(ApiResponse::ok(data)))
}

/// GET /api/issues/stats - 状态统计
pub async fn stats(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<IssueStats>>> {
    let repo = IssueRepository::new(state.get_db());
    let (total, by_status) = repo.count_by_status().await?;

    let mut stats = IssueStats {
        total,
        pending: 0,
        assigned: 0,
        in_progress: 0,
        resolved: 0,
        rejected: 0,
    };
    for row in by_status {
        match row.status {
            IssueStatus::Pending => stats.pending = row.count,
            IssueStatus::Assigned => stats.assigned = row.count,
            IssueStatus::InProgress => stats.in_progress = row.count,
            IssueStatus::Resolved => stats.resolved = row.count,
            IssueStatus::Rejected => stats.rejected = row.count,
        }
    }
    Ok(Json(ApiResponse::ok(stats)))
}

// ========== Lifecycle actions ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

/// PATCH /api/issues/{id}/status - 直接状态流转 (staff/admin)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    let ident = payload
        .actor
        .as_deref()
        .ok_or_else(|| AppError::invalid("Acting user is required"))?;
    let raw_status = payload
        .status
        .as_deref()
        .ok_or_else(|| AppError::validation("Status is required"))?;
    let new_status = IssueStatus::parse(raw_status)
        .ok_or_else(|| AppError::validation(format!("Unknown status: {raw_status}")))?;

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    let perms = permissions::resolve(&issue, &actor);
    if !perms.can_update_status {
        return Err(AppError::forbidden(
            "Only staff or administrators can update issue status",
        ));
    }

    let message = payload
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Status changed to {new_status}"));
    validate_required_text(&message, "message", MAX_TEXT_LEN)?;

    let updated = lifecycle::transition_status(&issue, new_status, message, actor.name(), Utc::now());
    let saved = repo.save(&id, updated).await?;
    Ok(Json(ApiResponse::ok_with_message(
        saved.into(),
        "Status updated successfully",
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub staff_name: Option<String>,
    #[serde(default)]
    pub staff_email: Option<String>,
}

/// POST /api/issues/{id}/assign - 指派给 staff (admin only)
pub async fn assign(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    let ident = payload
        .actor
        .as_deref()
        .ok_or_else(|| AppError::invalid("Acting user is required"))?;
    let (staff_id, staff_email) = match (
        payload.staff_id.as_deref().filter(|s| !s.is_empty()),
        payload.staff_email.as_deref().filter(|s| !s.is_empty()),
    ) {
        (Some(id), Some(email)) => (id.to_string(), email.to_string()),
        _ => return Err(AppError::invalid("staffId and staffEmail are required")),
    };

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    let perms = permissions::resolve(&issue, &actor);
    if !perms.can_assign {
        return Err(AppError::forbidden(
            "Only administrators can assign issues",
        ));
    }

    let staff = AssignedStaff {
        id: staff_id,
        name: payload
            .staff_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| staff_email.clone()),
        email: staff_email,
    };

    let updated = lifecycle::assign(&issue, staff, actor.name(), Utc::now());
    let saved = repo.save(&id, updated).await?;
    Ok(Json(ApiResponse::ok_with_message(
        saved.into(),
        "Issue assigned successfully",
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/issues/{id}/reject - 驳回 issue (admin only)
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    let ident = payload
        .actor
        .as_deref()
        .ok_or_else(|| AppError::invalid("Acting user is required"))?;
    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::validation("Rejection reason is required"))?;
    validate_required_text(reason, "reason", MAX_TEXT_LEN)?;

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    let updated = lifecycle::reject(&issue, &actor, reason, Utc::now())?;
    let saved = repo.save(&id, updated).await?;
    Ok(Json(ApiResponse::ok_with_message(
        saved.into(),
        "Issue rejected",
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRejectRequest {
    #[serde(default)]
    pub actor: Option<String>,
}

/// POST /api/issues/{id}/undo-reject - 撤销驳回 (admin only)
pub async fn undo_reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UndoRejectRequest>,
) -> AppResult<Json<ApiResponse<IssueView>>> {
    let ident = payload
        .actor
        .as_deref()
        .ok_or_else(|| AppError::invalid("Acting user is required"))?;

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    let updated = lifecycle::undo_reject(&issue, &actor, Utc::now())?;
    let saved = repo.save(&id, updated).await?;
    Ok(Json(ApiResponse::ok_with_message(
        saved.into(),
        "Rejection undone",
    )))
}

// ========== Upvotes & permissions ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /api/issues/{id}/upvote - 切换点赞
///
/// Eligibility is checked from a snapshot; the toggle itself is one atomic
/// statement in the store, so concurrent voters cannot corrupt the count.
pub async fn upvote(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpvoteRequest>,
) -> AppResult<Json<ApiResponse<UpvoteData>>> {
    let ident = payload
        .user_id
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::validation("User ID is required"))?;

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    if let Err(denied) = upvote::check_eligibility(&issue, &actor) {
        return Err(AppError::forbidden(denied.reason()));
    }

    let voter = upvote::voter_key(&actor).to_string();
    let updated = repo.toggle_upvote(&id, &voter).await?;
    let has_upvoted = updated.upvoted_by.iter().any(|v| *v == voter);

    Ok(Json(ApiResponse::ok(UpvoteData {
        upvotes: updated.upvotes,
        has_upvoted,
    })))
}

/// GET /api/issues/{id}/can-upvote?user= - 点赞资格预检 (只读)
pub async fn can_upvote(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<ApiResponse<upvote::UpvoteStatus>>> {
    let ident = query
        .user
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::validation("User identifier is required"))?;

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    Ok(Json(ApiResponse::ok(upvote::upvote_status(&issue, &actor))))
}

/// GET /api/issues/{id}/permissions?user= - 能力集查询 (只读)
pub async fn permissions(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<ApiResponse<permissions::PermissionSet>>> {
    let ident = query
        .user
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::validation("User identifier is required"))?;

    let repo = IssueRepository::new(state.get_db());
    let users = UserRepository::new(state.get_db());
    let issue = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;
    let actor = resolve_acting_user(&users, ident).await?;

    Ok(Json(ApiResponse::ok(permissions::resolve(&issue, &actor))))
}
