//! Issue Model

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{IssueStatus, Priority};

/// One entry in an issue's append-only timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub status: IssueStatus,
    pub message: String,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Staff member an issue is assigned to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedStaff {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Staff comment on an issue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Issue document
///
/// Invariants maintained by the lifecycle engine:
/// - the last timeline entry's status equals `status`
/// - `upvotes == upvoted_by.len()`
/// - resolved issues carry `progress = 100` and `resolved_at`
/// - the three rejection fields exist only while status is rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Record key (assigned by the store; never written back)
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "serde_helpers::opt_record_key"
    )]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub reported_by: String,
    #[serde(default)]
    pub user_email: String,
    /// Denormalized reporter id, when the client supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub upvoted_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<AssignedStaff>,
    #[serde(default)]
    pub comments: Vec<IssueComment>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    pub reported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Create issue payload
///
/// Required fields are optional here so the handler can report every missing
/// one in a single message. `reporterName` and `email` are accepted as
/// aliases for older clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "reporterName")]
    pub reported_by: Option<String>,
    #[serde(default, alias = "email")]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Raw update payload for an issue
///
/// The lifecycle engine projects these fields onto the acting role's
/// allow-list; none of them is applied directly by a handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub assigned_to: Option<AssignedStaff>,
    #[serde(default)]
    pub comments: Option<Vec<IssueComment>>,
}

