//! Repository Module
//!
//! CRUD operations over the SurrealDB collections. Repositories address
//! records explicitly via `(table, key)` targets; keys are plain strings
//! (caller-supplied or generated simple UUIDs).

pub mod issue;
pub mod payment;
pub mod user;

// Re-exports
pub use issue::{IssueRepository, SearchPage, SearchParams, SortDirection, SortKey, StatusCount};
pub use payment::PaymentRepository;
pub use user::UserRepository;

use shared::error::ApiError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => ApiError::not_found(what),
            RepoError::Database(msg) => ApiError::database(msg),
            RepoError::Validation(msg) => ApiError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Generate a new record key (simple hex UUID, no escaping needed)
pub fn new_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
