//! Issue Lifecycle Engine
//!
//! Owns status transitions, role-gated field projection, and timeline append
//! semantics. Functions take an issue snapshot and return the updated
//! snapshot; persistence happens in the HTTP layer (last-writer-wins, no
//! optimistic concurrency check).

use crate::db::models::{AssignedStaff, Issue, IssueUpdate, TimelineEntry};
use crate::identity::ActingUser;
use crate::issues::permissions;
use crate::utils::{AppError, AppResult};
use chrono::{DateTime, Utc};
use shared::{IssueStatus, Role};

/// How an update request is applied.
#[derive(Debug, Clone, Copy)]
pub enum UpdateMode<'a> {
    /// Backward-compatible unrestricted path: raw fields applied directly,
    /// no projection, no timeline entry. Kept for pre-permission clients;
    /// modelled as an explicit variant so it can be disabled by
    /// configuration instead of silently closed.
    LegacyUnrestricted,
    /// Role-scoped path: fields are projected onto the acting role's
    /// allow-list and exactly one timeline entry is appended.
    RoleScoped(&'a ActingUser),
}

/// Apply an update request to an issue snapshot.
pub fn apply_update(
    issue: &Issue,
    raw: &IssueUpdate,
    mode: UpdateMode<'_>,
    now: DateTime<Utc>,
) -> AppResult<Issue> {
    match mode {
        UpdateMode::LegacyUnrestricted => apply_unrestricted(issue, raw, now),
        UpdateMode::RoleScoped(actor) => apply_role_scoped(issue, raw, actor, now),
    }
}

fn apply_unrestricted(issue: &Issue, raw: &IssueUpdate, now: DateTime<Utc>) -> AppResult<Issue> {
    let mut updated = issue.clone();
    apply_citizen_fields(&mut updated, raw);
    apply_staff_fields(&mut updated, raw);
    updated.updated_at = Some(now);
    Ok(updated)
}

fn apply_role_scoped(
    issue: &Issue,
    raw: &IssueUpdate,
    actor: &ActingUser,
    now: DateTime<Utc>,
) -> AppResult<Issue> {
    let mut updated = issue.clone();
    let previous_status = issue.status;

    let applied = match actor.role {
        Role::Admin => {
            apply_citizen_fields(&mut updated, raw) + apply_staff_fields(&mut updated, raw)
        }
        Role::Staff => {
            let applied = apply_staff_fields(&mut updated, raw);
            if updated.status == IssueStatus::Resolved && previous_status != IssueStatus::Resolved {
                updated.progress = 100;
                updated.resolved_at = Some(now);
            }
            applied
        }
        Role::User => {
            if !permissions::is_reporter(issue, actor) {
                return Err(AppError::forbidden("You can only edit your own issues"));
            }
            apply_citizen_fields(&mut updated, raw)
        }
    };

    if applied == 0 {
        return Err(AppError::invalid("No valid updates for this role"));
    }

    let status_changed = updated.status != previous_status;
    let message = match actor.role {
        Role::Admin => "updated by administrator".to_string(),
        Role::Staff if status_changed => {
            format!("Status changed to {} by staff", updated.status)
        }
        Role::Staff => "updated by staff".to_string(),
        Role::User => "updated by reporter".to_string(),
    };

    push_timeline(&mut updated, message, actor.name(), now);
    updated.updated_at = Some(now);
    Ok(updated)
}

/// Fields a reporting citizen may change on their own issue
fn apply_citizen_fields(issue: &mut Issue, raw: &IssueUpdate) -> usize {
    let mut applied = 0;
    if let Some(title) = &raw.title {
        issue.title = title.clone();
        applied += 1;
    }
    if let Some(description) = &raw.description {
        issue.description = description.clone();
        applied += 1;
    }
    if let Some(category) = &raw.category {
        issue.category = category.clone();
        applied += 1;
    }
    if let Some(location) = &raw.location {
        issue.location = location.clone();
        applied += 1;
    }
    if let Some(image) = &raw.image {
        issue.image = Some(image.clone());
        applied += 1;
    }
    if let Some(images) = &raw.images {
        issue.images = images.clone();
        applied += 1;
    }
    if let Some(priority) = raw.priority {
        issue.priority = priority;
        applied += 1;
    }
    applied
}

/// Fields staff may change during triage
fn apply_staff_fields(issue: &mut Issue, raw: &IssueUpdate) -> usize {
    let mut applied = 0;
    if let Some(status) = raw.status {
        issue.status = status;
        applied += 1;
    }
    if let Some(progress) = raw.progress {
        issue.progress = progress;
        applied += 1;
    }
    if let Some(assigned_to) = &raw.assigned_to {
        issue.assigned_to = Some(assigned_to.clone());
        applied += 1;
    }
    if let Some(comments) = &raw.comments {
        issue.comments = comments.clone();
        applied += 1;
    }
    applied
}

/// Move an issue to a new status, appending the timeline entry.
///
/// Resolution forces progress to 100 and stamps `resolved_at`; other
/// transitions leave progress untouched.
pub fn transition_status(
    issue: &Issue,
    new_status: IssueStatus,
    message: String,
    updated_by: String,
    now: DateTime<Utc>,
) -> Issue {
    let mut updated = issue.clone();
    updated.status = new_status;
    if new_status == IssueStatus::Resolved {
        updated.progress = 100;
        updated.resolved_at = Some(now);
    }
    push_timeline(&mut updated, message, updated_by, now);
    updated.updated_at = Some(now);
    updated
}

/// Reject an issue. Admin only; issues already being worked or done cannot
/// be rejected.
pub fn reject(
    issue: &Issue,
    actor: &ActingUser,
    reason: &str,
    now: DateTime<Utc>,
) -> AppResult<Issue> {
    if actor.role != Role::Admin {
        return Err(AppError::forbidden("Only administrators can reject issues"));
    }
    if issue.status == IssueStatus::Rejected {
        return Err(AppError::invalid_state("Issue is already rejected"));
    }
    if matches!(issue.status, IssueStatus::InProgress | IssueStatus::Resolved) {
        return Err(AppError::invalid_state(format!(
            "Cannot reject an issue that is {}",
            issue.status
        )));
    }

    let mut updated = transition_status(
        issue,
        IssueStatus::Rejected,
        format!("Rejected by administrator: {reason}"),
        actor.name(),
        now,
    );
    updated.rejection_reason = Some(reason.to_string());
    updated.rejected_at = Some(now);
    updated.rejected_by = Some(actor.name());
    Ok(updated)
}

/// Undo a rejection, returning the issue to pending. Admin only.
pub fn undo_reject(issue: &Issue, actor: &ActingUser, now: DateTime<Utc>) -> AppResult<Issue> {
    if actor.role != Role::Admin {
        return Err(AppError::forbidden(
            "Only administrators can undo a rejection",
        ));
    }
    if issue.status != IssueStatus::Rejected {
        return Err(AppError::invalid_state("Issue is not rejected"));
    }

    let mut updated = transition_status(
        issue,
        IssueStatus::Pending,
        "Rejection undone by administrator".to_string(),
        actor.name(),
        now,
    );
    updated.rejection_reason = None;
    updated.rejected_at = None;
    updated.rejected_by = None;
    Ok(updated)
}

/// Assign an issue to a staff member and move it to assigned.
pub fn assign(
    issue: &Issue,
    staff: AssignedStaff,
    assigned_by: String,
    now: DateTime<Utc>,
) -> Issue {
    let message = format!("Assigned to {}", staff.name);
    let mut updated = transition_status(issue, IssueStatus::Assigned, message, assigned_by, now);
    updated.assigned_to = Some(staff);
    updated
}

/// Raise an issue's priority after a boost purchase, leaving a timeline note
/// at the current status.
pub fn boost_priority(issue: &Issue, boosted_by: String, now: DateTime<Utc>) -> Issue {
    let mut updated = issue.clone();
    updated.priority = shared::Priority::High;
    push_timeline(
        &mut updated,
        "Priority boost applied".to_string(),
        boosted_by,
        now,
    );
    updated.updated_at = Some(now);
    updated
}

fn push_timeline(issue: &mut Issue, message: String, updated_by: String, now: DateTime<Utc>) {
    issue.timeline.push(TimelineEntry {
        status: issue.status,
        message,
        updated_by,
        updated_at: now,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::test_support::{issue_reported_by, user_with_role};
    use shared::Priority;

    fn raw_title(title: &str) -> IssueUpdate {
        IssueUpdate {
            title: Some(title.to_string()),
            ..IssueUpdate::default()
        }
    }

    #[test]
    fn admin_update_always_applies_and_grows_timeline_by_one() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let admin = user_with_role("admin@city.gov", Role::Admin);
        let raw = IssueUpdate {
            title: Some("New title".to_string()),
            status: Some(IssueStatus::InProgress),
            progress: Some(40),
            ..IssueUpdate::default()
        };

        let before = issue.timeline.len();
        let updated =
            apply_update(&issue, &raw, UpdateMode::RoleScoped(&admin), Utc::now()).unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.status, IssueStatus::InProgress);
        assert_eq!(updated.progress, 40);
        assert_eq!(updated.timeline.len(), before + 1);
        assert_eq!(
            updated.timeline.last().unwrap().message,
            "updated by administrator"
        );
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn staff_title_only_update_is_invalid() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = user_with_role("staff@city.gov", Role::Staff);

        let err = apply_update(
            &issue,
            &raw_title("x"),
            UpdateMode::RoleScoped(&staff),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Invalid { .. }));
    }

    #[test]
    fn staff_resolving_forces_progress_and_resolved_at() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = user_with_role("staff@city.gov", Role::Staff);
        let raw = IssueUpdate {
            status: Some(IssueStatus::Resolved),
            ..IssueUpdate::default()
        };

        let updated =
            apply_update(&issue, &raw, UpdateMode::RoleScoped(&staff), Utc::now()).unwrap();
        assert_eq!(updated.status, IssueStatus::Resolved);
        assert_eq!(updated.progress, 100);
        assert!(updated.resolved_at.is_some());
        assert_eq!(
            updated.timeline.last().unwrap().message,
            "Status changed to resolved by staff"
        );
    }

    #[test]
    fn staff_non_status_update_leaves_progress_alone() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = user_with_role("staff@city.gov", Role::Staff);
        let raw = IssueUpdate {
            progress: Some(60),
            ..IssueUpdate::default()
        };

        let updated =
            apply_update(&issue, &raw, UpdateMode::RoleScoped(&staff), Utc::now()).unwrap();
        assert_eq!(updated.progress, 60);
        assert!(updated.resolved_at.is_none());
        assert_eq!(updated.timeline.last().unwrap().message, "updated by staff");
    }

    #[test]
    fn non_reporter_citizen_is_forbidden_regardless_of_payload() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let other = user_with_role("other@city.gov", Role::User);

        let err = apply_update(
            &issue,
            &raw_title("hijack"),
            UpdateMode::RoleScoped(&other),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[test]
    fn reporter_citizen_updates_allowed_fields_only() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let citizen = user_with_role("citizen@city.gov", Role::User);
        let raw = IssueUpdate {
            title: Some("Clearer title".to_string()),
            priority: Some(Priority::High),
            // Outside the citizen allow-list; must be ignored
            status: Some(IssueStatus::Resolved),
            progress: Some(90),
            ..IssueUpdate::default()
        };

        let updated =
            apply_update(&issue, &raw, UpdateMode::RoleScoped(&citizen), Utc::now()).unwrap();
        assert_eq!(updated.title, "Clearer title");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.status, IssueStatus::Pending);
        assert_eq!(updated.progress, 0);
        assert_eq!(
            updated.timeline.last().unwrap().message,
            "updated by reporter"
        );
    }

    #[test]
    fn citizen_update_with_only_staff_fields_is_invalid() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let citizen = user_with_role("citizen@city.gov", Role::User);
        let raw = IssueUpdate {
            progress: Some(50),
            ..IssueUpdate::default()
        };

        let err = apply_update(&issue, &raw, UpdateMode::RoleScoped(&citizen), Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid { .. }));
    }

    #[test]
    fn legacy_mode_applies_any_field_without_timeline_entry() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let raw = IssueUpdate {
            title: Some("Raw write".to_string()),
            progress: Some(55),
            ..IssueUpdate::default()
        };

        let before = issue.timeline.len();
        let updated =
            apply_update(&issue, &raw, UpdateMode::LegacyUnrestricted, Utc::now()).unwrap();
        assert_eq!(updated.title, "Raw write");
        assert_eq!(updated.progress, 55);
        assert_eq!(updated.timeline.len(), before);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn reject_then_undo_restores_pending_and_clears_rejection_fields() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let admin = user_with_role("admin@city.gov", Role::Admin);
        let now = Utc::now();

        let rejected = reject(&issue, &admin, "duplicate", now).unwrap();
        assert_eq!(rejected.status, IssueStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("duplicate"));
        assert!(rejected.rejected_at.is_some());
        assert!(rejected.rejected_by.is_some());
        assert_eq!(
            rejected.timeline.last().unwrap().status,
            IssueStatus::Rejected
        );

        let restored = undo_reject(&rejected, &admin, now).unwrap();
        assert_eq!(restored.status, IssueStatus::Pending);
        assert!(restored.rejection_reason.is_none());
        assert!(restored.rejected_at.is_none());
        assert!(restored.rejected_by.is_none());
        assert_eq!(
            restored.timeline.last().unwrap().message,
            "Rejection undone by administrator"
        );
    }

    #[test]
    fn undo_reject_without_prior_reject_is_invalid_state() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let admin = user_with_role("admin@city.gov", Role::Admin);
        let err = undo_reject(&issue, &admin, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));
    }

    #[test]
    fn reject_requires_admin() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = user_with_role("staff@city.gov", Role::Staff);
        let err = reject(&issue, &staff, "nope", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[test]
    fn reject_fails_on_worked_or_done_issues() {
        let admin = user_with_role("admin@city.gov", Role::Admin);
        for status in [IssueStatus::InProgress, IssueStatus::Resolved] {
            let mut issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
            issue.status = status;
            let err = reject(&issue, &admin, "too late", Utc::now()).unwrap_err();
            assert!(matches!(err, AppError::InvalidState { .. }));
        }
    }

    #[test]
    fn double_reject_is_invalid_state() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let admin = user_with_role("admin@city.gov", Role::Admin);
        let rejected = reject(&issue, &admin, "duplicate", Utc::now()).unwrap();
        let err = reject(&rejected, &admin, "again", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));
    }

    #[test]
    fn assign_sets_staff_and_status() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let staff = AssignedStaff {
            id: "staff-7".to_string(),
            name: "Sam Worker".to_string(),
            email: "sam@city.gov".to_string(),
        };

        let updated = assign(&issue, staff, "Ada Admin".to_string(), Utc::now());
        assert_eq!(updated.status, IssueStatus::Assigned);
        assert_eq!(updated.assigned_to.as_ref().unwrap().name, "Sam Worker");
        assert_eq!(
            updated.timeline.last().unwrap().message,
            "Assigned to Sam Worker"
        );
    }

    #[test]
    fn boost_raises_priority_and_keeps_status() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let boosted = boost_priority(&issue, "citizen@city.gov".to_string(), Utc::now());
        assert_eq!(boosted.priority, Priority::High);
        assert_eq!(boosted.status, issue.status);
        assert_eq!(
            boosted.timeline.last().unwrap().message,
            "Priority boost applied"
        );
    }

    #[test]
    fn timeline_last_status_tracks_current_status() {
        let issue = issue_reported_by("citizen@city.gov", "Jane Citizen");
        let updated = transition_status(
            &issue,
            IssueStatus::InProgress,
            "Crew dispatched".to_string(),
            "Sam Worker".to_string(),
            Utc::now(),
        );
        assert_eq!(updated.timeline.last().unwrap().status, updated.status);
        assert_eq!(updated.progress, 0);
    }
}
