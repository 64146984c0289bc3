//! User Repository

use super::{BaseRepository, RepoError, RepoResult, new_key};
use crate::db::models::{User, UserUpdate};
use chrono::{DateTime, Utc};
use shared::Role;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all users, oldest first
    pub async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY createdAt ASC")
            .await?
            .take(0)?;
        Ok(users)
    }

    /// Find user by email (primary lookup key)
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by record key
    pub async fn find_by_key(&self, key: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self.base.db().select((TABLE, key)).await?;
        Ok(user)
    }

    /// Find user by the auth provider's uid
    pub async fn find_by_uid(&self, uid: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE uid = $uid LIMIT 1")
            .bind(("uid", uid.to_string()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user
    pub async fn create(&self, user: User) -> RepoResult<User> {
        let created: Option<User> = self
            .base
            .db()
            .create((TABLE, new_key()))
            .content(user)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Apply a profile update to the user with the given email
    pub async fn update(&self, email: &str, data: UserUpdate) -> RepoResult<User> {
        let mut user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {email}")))?;

        if let Some(display_name) = data.display_name {
            user.display_name = Some(display_name);
        }
        if let Some(photo_url) = data.photo_url {
            user.photo_url = Some(photo_url);
        }
        if let Some(uid) = data.uid {
            user.uid = Some(uid);
        }
        user.updated_at = Some(Utc::now());

        self.save(user).await
    }

    /// Change a user's role
    pub async fn update_role(&self, email: &str, role: Role) -> RepoResult<User> {
        let mut user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {email}")))?;
        user.role = role;
        user.updated_at = Some(Utc::now());
        self.save(user).await
    }

    /// Activate premium for a subscription window
    pub async fn set_premium(
        &self,
        email: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<User> {
        let mut user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {email}")))?;
        user.is_premium = true;
        user.premium_since = Some(since);
        user.premium_until = Some(until);
        user.updated_at = Some(Utc::now());
        self.save(user).await
    }

    /// Persist a full user snapshot (last-writer-wins)
    async fn save(&self, user: User) -> RepoResult<User> {
        let key = user
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("User snapshot has no record key".to_string()))?;
        let updated: Option<User> = self
            .base
            .db()
            .update((TABLE, key.as_str()))
            .content(user)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("User {key}")))
    }
}
