//! Database Models

// Serde helpers
pub mod serde_helpers;

// Issues
pub mod issue;

// Users
pub mod user;

// Payments
pub mod payment;

// Re-exports
pub use issue::{AssignedStaff, Issue, IssueComment, IssueCreate, IssueUpdate, TimelineEntry};
pub use payment::{
    BoostPaymentCreate, BoostPaymentRecord, PaymentCreate, PaymentRecord, SubscriptionPlan,
};
pub use user::{User, UserCreate, UserUpdate};
