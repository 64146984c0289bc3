//! Acting-user identity
//!
//! The system trusts client-supplied identity (no session protocol): handlers
//! receive an identifier that may be an email or an opaque id and resolve it
//! against the user directory here.

use crate::db::models::User;
use crate::db::repository::UserRepository;
use crate::utils::AppResult;
use shared::Role;
use shared::error::ApiError;

/// Snapshot of the user performing a request
#[derive(Debug, Clone)]
pub struct ActingUser {
    pub id: Option<String>,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl ActingUser {
    /// Name recorded in timeline entries and audit fields
    pub fn name(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.email.clone())
    }
}

impl From<User> for ActingUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        }
    }
}

/// Resolve an acting user from an identifier that may be an email or an
/// opaque id.
///
/// Deliberate fallback chain, preserved from the original deployment where
/// clients send whichever identifier they have: email lookup, then opaque-id
/// lookup (record key, then auth uid), then email once more.
pub async fn resolve_acting_user(users: &UserRepository, ident: &str) -> AppResult<ActingUser> {
    if let Some(user) = users.find_by_email(ident).await? {
        return Ok(user.into());
    }
    if let Some(user) = users.find_by_key(ident).await? {
        return Ok(user.into());
    }
    if let Some(user) = users.find_by_uid(ident).await? {
        return Ok(user.into());
    }
    if let Some(user) = users.find_by_email(ident).await? {
        return Ok(user.into());
    }
    Err(ApiError::not_found("User"))
}
