//! User Model

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Role;

/// User document, keyed for lookup by email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Record key (assigned by the store; never written back)
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "serde_helpers::opt_record_key"
    )]
    pub id: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Unknown role strings normalize to `user`
    #[serde(default)]
    pub role: Role,
    /// Optional secondary credential check supplied by the auth provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_since: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Signup payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub uid: Option<String>,
}

/// Profile update payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}
