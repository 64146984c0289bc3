//! Response view types
//!
//! Store models skip their record key during serialization (writes address
//! records explicitly), so API responses wrap them with the key exposed as
//! `id`.

use crate::db::models::{BoostPaymentRecord, Issue, PaymentRecord, User};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueView {
    pub id: String,
    #[serde(flatten)]
    pub issue: Issue,
}

impl From<Issue> for IssueView {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id.clone().unwrap_or_default(),
            issue,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    #[serde(flatten)]
    pub user: User,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.clone().unwrap_or_default(),
            user,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: String,
    #[serde(flatten)]
    pub record: PaymentRecord,
}

impl From<PaymentRecord> for PaymentView {
    fn from(record: PaymentRecord) -> Self {
        Self {
            id: record.id.clone().unwrap_or_default(),
            record,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostPaymentView {
    pub id: String,
    #[serde(flatten)]
    pub record: BoostPaymentRecord,
}

impl From<BoostPaymentRecord> for BoostPaymentView {
    fn from(record: BoostPaymentRecord) -> Self {
        Self {
            id: record.id.clone().unwrap_or_default(),
            record,
        }
    }
}
