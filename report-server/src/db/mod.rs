//! Database Module
//!
//! Embedded SurrealDB storage. Collections are schemaless documents: `issue`,
//! `user`, `payment`, `boost_payment`.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

pub const NAMESPACE: &str = "public_infra";
pub const DATABASE: &str = "reports";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at the given path
    pub async fn new(path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        tracing::info!(path, "Database connection established (embedded SurrealDB)");

        Ok(Self { db })
    }
}
