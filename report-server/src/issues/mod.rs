//! Issue domain logic
//!
//! # 结构
//!
//! - [`permissions`] - 权限解析 (capability set per issue/user pair)
//! - [`lifecycle`] - 状态流转、字段投影、timeline 追加
//! - [`upvote`] - 点赞资格策略
//!
//! All functions here are pure snapshot-in/snapshot-out; the HTTP layer owns
//! persistence. The one store-side exception is the atomic upvote toggle in
//! the issue repository.

pub mod lifecycle;
pub mod permissions;
pub mod upvote;

pub use lifecycle::UpdateMode;
pub use permissions::PermissionSet;
pub use upvote::UpvoteDenied;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::models::{Issue, TimelineEntry};
    use crate::identity::ActingUser;
    use chrono::Utc;
    use shared::{IssueStatus, Priority, Role};

    pub fn issue_reported_by(email: &str, display_name: &str) -> Issue {
        let now = Utc::now();
        Issue {
            id: Some("issue-1".to_string()),
            title: "Broken streetlight".to_string(),
            description: "The light at 5th and Main has been out for a week".to_string(),
            category: "electricity".to_string(),
            location: "5th and Main".to_string(),
            reported_by: display_name.to_string(),
            user_email: email.to_string(),
            user_id: None,
            status: IssueStatus::Pending,
            priority: Priority::Normal,
            progress: 0,
            image: None,
            images: vec![],
            upvotes: 0,
            upvoted_by: vec![],
            assigned_to: None,
            comments: vec![],
            timeline: vec![TimelineEntry {
                status: IssueStatus::Pending,
                message: "Issue reported by citizen".to_string(),
                updated_by: display_name.to_string(),
                updated_at: now,
            }],
            reported_at: now,
            updated_at: None,
            resolved_at: None,
            rejection_reason: None,
            rejected_at: None,
            rejected_by: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn user_with_role(email: &str, role: Role) -> ActingUser {
        ActingUser {
            id: Some(format!("uid-{email}")),
            email: email.to_string(),
            display_name: None,
            role,
        }
    }
}
