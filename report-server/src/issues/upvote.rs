//! Upvote Eligibility Policy
//!
//! Decides, per (issue, user), whether an upvote toggle is permitted. The
//! toggle itself is executed atomically by the issue repository; eligibility
//! and toggle are deliberately not atomic with each other.

use crate::db::models::Issue;
use crate::identity::ActingUser;
use crate::issues::permissions;
use serde::Serialize;
use shared::Role;

/// Why an upvote was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpvoteDenied {
    /// Reporters cannot upvote their own issues
    OwnIssue,
    /// Staff and administrators do not vote
    RoleRestriction,
}

impl UpvoteDenied {
    /// Machine-readable reason string exposed to clients
    pub fn reason(&self) -> &'static str {
        match self {
            UpvoteDenied::OwnIssue => "own_issue",
            UpvoteDenied::RoleRestriction => "role_restriction",
        }
    }
}

/// Check whether the acting user may toggle an upvote on the issue.
///
/// Ownership is checked first so a reporter is always told `own_issue`,
/// even when their role field was tampered with.
pub fn check_eligibility(issue: &Issue, user: &ActingUser) -> Result<(), UpvoteDenied> {
    if is_own_issue(issue, user) {
        return Err(UpvoteDenied::OwnIssue);
    }
    if matches!(user.role, Role::Admin | Role::Staff) {
        return Err(UpvoteDenied::RoleRestriction);
    }
    Ok(())
}

/// Three-way ownership check: email, display name, or denormalized reporter
/// id. Any single match blocks the vote.
fn is_own_issue(issue: &Issue, user: &ActingUser) -> bool {
    if permissions::is_reporter(issue, user) {
        return true;
    }
    match (&issue.user_id, &user.id) {
        (Some(reporter_id), Some(actor_id)) => reporter_id == actor_id,
        _ => false,
    }
}

/// The identifier recorded in the upvoter set: opaque id when the user has
/// one, email otherwise. One canonical key per user keeps the toggle
/// idempotent.
pub fn voter_key(user: &ActingUser) -> &str {
    user.id.as_deref().unwrap_or(&user.email)
}

/// Read-only preflight result for UI use
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteStatus {
    pub can_upvote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub has_upvoted: bool,
}

/// Mirror of [`check_eligibility`] that never mutates state.
pub fn upvote_status(issue: &Issue, user: &ActingUser) -> UpvoteStatus {
    let has_upvoted = issue
        .upvoted_by
        .iter()
        .any(|v| v == voter_key(user));
    match check_eligibility(issue, user) {
        Ok(()) => UpvoteStatus {
            can_upvote: true,
            reason: None,
            has_upvoted,
        },
        Err(denied) => UpvoteStatus {
            can_upvote: false,
            reason: Some(denied.reason()),
            has_upvoted,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::test_support::{issue_reported_by, user_with_role};

    #[test]
    fn staff_and_admin_are_role_restricted() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        for role in [Role::Staff, Role::Admin] {
            let user = user_with_role("official@city.gov", role);
            assert_eq!(
                check_eligibility(&issue, &user),
                Err(UpvoteDenied::RoleRestriction)
            );
        }
    }

    #[test]
    fn reporter_is_blocked_by_email_match() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let user = user_with_role("CITIZEN@city.gov", Role::User);
        assert_eq!(check_eligibility(&issue, &user), Err(UpvoteDenied::OwnIssue));
    }

    #[test]
    fn reporter_is_blocked_even_with_tampered_role() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let user = user_with_role("citizen@city.gov", Role::Admin);
        assert_eq!(check_eligibility(&issue, &user), Err(UpvoteDenied::OwnIssue));
    }

    #[test]
    fn reporter_is_blocked_by_display_name_match() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let mut user = user_with_role("fresh-account@city.gov", Role::User);
        user.display_name = Some("JANE CITIZEN".to_string());
        assert_eq!(check_eligibility(&issue, &user), Err(UpvoteDenied::OwnIssue));
    }

    #[test]
    fn reporter_is_blocked_by_denormalized_id_match() {
        let mut issue = issue_reported_by("old-record@city.gov", "Jane Citizen");
        issue.user_id = Some("uid-42".to_string());
        let mut user = user_with_role("new-email@city.gov", Role::User);
        user.id = Some("uid-42".to_string());
        assert_eq!(check_eligibility(&issue, &user), Err(UpvoteDenied::OwnIssue));
    }

    #[test]
    fn unrelated_citizen_may_vote() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let user = user_with_role("neighbour@city.gov", Role::User);
        assert_eq!(check_eligibility(&issue, &user), Ok(()));
    }

    #[test]
    fn preflight_reports_existing_vote() {
        let mut issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let user = user_with_role("neighbour@city.gov", Role::User);
        issue.upvoted_by.push(voter_key(&user).to_string());

        let status = upvote_status(&issue, &user);
        assert!(status.can_upvote);
        assert!(status.has_upvoted);
        assert!(status.reason.is_none());
    }

    #[test]
    fn preflight_carries_denial_reason() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = user_with_role("staff@city.gov", Role::Staff);
        let status = upvote_status(&issue, &staff);
        assert!(!status.can_upvote);
        assert_eq!(status.reason, Some("role_restriction"));
    }
}
