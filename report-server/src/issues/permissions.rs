//! Permission Resolver
//!
//! Single decision point for what an acting user may do to an issue. Every
//! mutating endpoint consults this instead of branching on roles inline.

use crate::db::models::Issue;
use crate::identity::ActingUser;
use serde::Serialize;
use shared::Role;

/// Capability set for one (issue, user) pair
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_update_status: bool,
    pub can_assign: bool,
    pub is_reporter: bool,
}

/// Compute the capability set. Pure: never touches the store.
pub fn resolve(issue: &Issue, user: &ActingUser) -> PermissionSet {
    let is_reporter = is_reporter(issue, user);
    let role = user.role;

    PermissionSet {
        can_edit: matches!(role, Role::Admin | Role::Staff) || (role == Role::User && is_reporter),
        can_delete: role == Role::Admin || (role == Role::User && is_reporter),
        can_update_status: matches!(role, Role::Admin | Role::Staff),
        can_assign: role == Role::Admin,
        is_reporter,
    }
}

/// Whether the acting user originally submitted the issue.
///
/// Dual check: email match, falling back to display name for records that
/// predate email capture. Both case-insensitive.
pub fn is_reporter(issue: &Issue, user: &ActingUser) -> bool {
    if !issue.user_email.is_empty() && issue.user_email.eq_ignore_ascii_case(&user.email) {
        return true;
    }
    if let Some(name) = &user.display_name
        && !name.is_empty()
        && name.eq_ignore_ascii_case(&issue.reported_by)
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::test_support::{issue_reported_by, user_with_role};
    use shared::Role;

    #[test]
    fn admin_has_everything_but_reporter_flag() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let admin = user_with_role("admin@city.gov", Role::Admin);
        let perms = resolve(&issue, &admin);
        assert!(perms.can_edit);
        assert!(perms.can_delete);
        assert!(perms.can_update_status);
        assert!(perms.can_assign);
        assert!(!perms.is_reporter);
    }

    #[test]
    fn staff_cannot_delete_or_assign() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = user_with_role("staff@city.gov", Role::Staff);
        let perms = resolve(&issue, &staff);
        assert!(perms.can_edit);
        assert!(!perms.can_delete);
        assert!(perms.can_update_status);
        assert!(!perms.can_assign);
    }

    #[test]
    fn reporter_citizen_can_edit_and_delete_own_issue() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let citizen = user_with_role("citizen@city.gov", Role::User);
        let perms = resolve(&issue, &citizen);
        assert!(perms.can_edit);
        assert!(perms.can_delete);
        assert!(!perms.can_update_status);
        assert!(!perms.can_assign);
        assert!(perms.is_reporter);
    }

    #[test]
    fn unrelated_citizen_gets_nothing() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let other = user_with_role("other@city.gov", Role::User);
        let perms = resolve(&issue, &other);
        assert!(!perms.can_edit);
        assert!(!perms.can_delete);
        assert!(!perms.is_reporter);
    }

    #[test]
    fn reporter_match_is_case_insensitive_on_email() {
        let issue = issue_reported_by("Citizen@City.GOV", "Jane Citizen");
        let citizen = user_with_role("citizen@city.gov", Role::User);
        assert!(is_reporter(&issue, &citizen));
    }

    #[test]
    fn reporter_match_falls_back_to_display_name() {
        let mut issue = issue_reported_by("", "Jane Citizen");
        issue.user_email = String::new();
        let mut citizen = user_with_role("somewhere-else@city.gov", Role::User);
        citizen.display_name = Some("jane citizen".to_string());
        assert!(is_reporter(&issue, &citizen));
    }
}
