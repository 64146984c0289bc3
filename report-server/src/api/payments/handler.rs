//! Payments API Handlers
//!
//! Records are append-only. The follow-up writes (premium flag on the user,
//! priority raise on the issue) are separate store operations: a crash
//! between the two leaves a recorded payment without its side effect. Known
//! limitation, kept from the original system.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::api::convert::{BoostPaymentView, IssueView, PaymentView};
use crate::core::ServerState;
use crate::db::models::{BoostPaymentCreate, BoostPaymentRecord, PaymentCreate, PaymentRecord};
use crate::db::repository::{IssueRepository, PaymentRepository, UserRepository};
use crate::issues::lifecycle;
use crate::utils::{AppError, AppResult};
use shared::ApiResponse;

/// Boost window length. Expiry is advisory data for clients; the priority
/// raise itself is immediate and permanent (no scheduler).
const BOOST_DAYS: i64 = 7;

fn new_transaction_id() -> String {
    format!("TXN-{}", Uuid::new_v4().simple())
}

fn new_invoice_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("INV-{}-{}", Utc::now().format("%Y%m%d"), &suffix[..8])
}

fn require_positive_amount(amount: Option<Decimal>) -> AppResult<Decimal> {
    let amount = amount.ok_or_else(|| AppError::validation("Amount is required"))?;
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be positive"));
    }
    Ok(amount)
}

/// POST /api/payments - 记录订阅支付并激活 premium
pub async fn create_subscription(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<ApiResponse<PaymentView>>> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("Email is required"))?;
    let amount = require_positive_amount(payload.amount)?;

    let users = UserRepository::new(state.get_db());
    users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let now = Utc::now();
    let plan = payload.plan.unwrap_or_default();
    let subscription_end = now + Duration::days(plan.duration_days());

    let record = PaymentRecord {
        id: None,
        email: email.clone(),
        amount,
        currency: payload.currency.unwrap_or_else(|| "USD".to_string()),
        plan,
        transaction_id: new_transaction_id(),
        invoice_id: new_invoice_id(),
        subscription_start: now,
        subscription_end,
        created_at: now,
    };

    let payments = PaymentRepository::new(state.get_db());
    let created = payments.create_subscription(record).await?;

    // Second write, not atomic with the insert above
    users.set_premium(&email, now, subscription_end).await?;
    tracing::info!(email = %email, plan = ?plan, "premium subscription recorded");

    Ok(Json(ApiResponse::ok_with_message(
        created.into(),
        "Payment recorded and premium activated",
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostData {
    pub payment: BoostPaymentView,
    pub issue: IssueView,
}

/// POST /api/payments/boost - 记录 priority boost 支付并提升优先级
pub async fn create_boost(
    State(state): State<ServerState>,
    Json(payload): Json<BoostPaymentCreate>,
) -> AppResult<Json<ApiResponse<BoostData>>> {
    let issue_id = payload
        .issue_id
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or_else(|| AppError::validation("issueId is required"))?;
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("Email is required"))?;
    let amount = require_positive_amount(payload.amount)?;

    let issues = IssueRepository::new(state.get_db());
    let issue = issues
        .find_by_id(issue_id)
        .await?
        .ok_or_else(|| AppError::not_found("Issue"))?;

    let now = Utc::now();
    let record = BoostPaymentRecord {
        id: None,
        issue_id: issue_id.to_string(),
        email: email.clone(),
        amount,
        currency: payload.currency.unwrap_or_else(|| "USD".to_string()),
        transaction_id: new_transaction_id(),
        boost_start: now,
        boost_end: now + Duration::days(BOOST_DAYS),
        created_at: now,
    };

    let payments = PaymentRepository::new(state.get_db());
    let created = payments.create_boost(record).await?;

    // Second write, not atomic with the insert above
    let boosted = lifecycle::boost_priority(&issue, email, now);
    let saved = issues.save(issue_id, boosted).await?;
    tracing::info!(issue_id, "priority boost recorded");

    Ok(Json(ApiResponse::ok_with_message(
        BoostData {
            payment: created.into(),
            issue: saved.into(),
        },
        "Boost payment recorded and priority raised",
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub count: usize,
    pub payments: Vec<PaymentView>,
    pub boosts: Vec<BoostPaymentView>,
}

/// GET /api/payments/user/{email} - 某个用户的支付历史
pub async fn by_payer(
    State(state): State<ServerState>,
    Path(email): Path<String>,
) -> AppResult<Json<ApiResponse<PaymentHistory>>> {
    let payments = PaymentRepository::new(state.get_db());
    let subscriptions = payments.find_subscriptions_by_payer(&email).await?;
    let boosts = payments.find_boosts_by_payer(&email).await?;

    Ok(Json(ApiResponse::ok(PaymentHistory {
        count: subscriptions.len() + boosts.len(),
        payments: subscriptions.into_iter().map(PaymentView::from).collect(),
        boosts: boosts.into_iter().map(BoostPaymentView::from).collect(),
    })))
}
