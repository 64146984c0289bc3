//! Payment Repository
//!
//! Append-only: records are inserted and listed, never mutated.

use super::{BaseRepository, RepoError, RepoResult, new_key};
use crate::db::models::{BoostPaymentRecord, PaymentRecord};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PAYMENT_TABLE: &str = "payment";
const BOOST_TABLE: &str = "boost_payment";

#[derive(Clone)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Record a premium subscription payment
    pub async fn create_subscription(&self, record: PaymentRecord) -> RepoResult<PaymentRecord> {
        let created: Option<PaymentRecord> = self
            .base
            .db()
            .create((PAYMENT_TABLE, new_key()))
            .content(record)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to record payment".to_string()))
    }

    /// Record a priority boost payment
    pub async fn create_boost(&self, record: BoostPaymentRecord) -> RepoResult<BoostPaymentRecord> {
        let created: Option<BoostPaymentRecord> = self
            .base
            .db()
            .create((BOOST_TABLE, new_key()))
            .content(record)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to record boost payment".to_string()))
    }

    /// All subscription payments by a payer, newest first
    pub async fn find_subscriptions_by_payer(
        &self,
        email: &str,
    ) -> RepoResult<Vec<PaymentRecord>> {
        let records: Vec<PaymentRecord> = self
            .base
            .db()
            .query("SELECT * FROM payment WHERE email = $email ORDER BY createdAt DESC")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// All boost payments by a payer, newest first
    pub async fn find_boosts_by_payer(&self, email: &str) -> RepoResult<Vec<BoostPaymentRecord>> {
        let records: Vec<BoostPaymentRecord> = self
            .base
            .db()
            .query("SELECT * FROM boost_payment WHERE email = $email ORDER BY createdAt DESC")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(records)
    }
}
