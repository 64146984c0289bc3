//! Payment Models
//!
//! Payment and boost-payment records are append-only: no update or delete
//! operations exist anywhere in the system.

use super::serde_helpers;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Premium subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Monthly,
    Yearly,
}

impl SubscriptionPlan {
    /// Subscription window length in days
    pub fn duration_days(&self) -> i64 {
        match self {
            SubscriptionPlan::Monthly => 30,
            SubscriptionPlan::Yearly => 365,
        }
    }
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        SubscriptionPlan::Monthly
    }
}

/// Premium subscription payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "serde_helpers::opt_record_key"
    )]
    pub id: Option<String>,
    pub email: String,
    pub amount: Decimal,
    pub currency: String,
    pub plan: SubscriptionPlan,
    pub transaction_id: String,
    pub invoice_id: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Priority boost payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostPaymentRecord {
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "serde_helpers::opt_record_key"
    )]
    pub id: Option<String>,
    pub issue_id: String,
    pub email: String,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: String,
    pub boost_start: DateTime<Utc>,
    pub boost_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Premium subscription purchase payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub plan: Option<SubscriptionPlan>,
}

/// Priority boost purchase payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostPaymentCreate {
    #[serde(default)]
    pub issue_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}
