//! Normalized domain enums
//!
//! Role, issue status, and priority are fixed enums normalized once at the
//! boundary. Internal code compares enum values only, never raw strings —
//! the store and older clients carry case variance and both `"in progress"`
//! and `"in-progress"` spellings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// User role governing permitted operations
///
/// Unknown or missing roles are treated as `User` for permission purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Staff,
    Admin,
}

impl Role {
    /// Parse a raw role string. Never fails: anything unrecognized is `User`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "staff" => Role::Staff,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Missing values are handled by #[serde(default)] on the field
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Role::parse(&s)).unwrap_or_default())
    }
}

/// Issue lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Pending,
    Assigned,
    InProgress,
    Resolved,
    Rejected,
}

impl IssueStatus {
    /// Parse a raw status string, tolerating case variance and both the
    /// spaced and hyphenated spellings of "in progress".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(IssueStatus::Pending),
            "assigned" => Some(IssueStatus::Assigned),
            "in-progress" | "in progress" | "inprogress" => Some(IssueStatus::InProgress),
            "resolved" => Some(IssueStatus::Resolved),
            "rejected" => Some(IssueStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::Assigned => "assigned",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Rejected => "rejected",
        }
    }
}

impl Default for IssueStatus {
    fn default() -> Self {
        IssueStatus::Pending
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        IssueStatus::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown issue status: {raw}")))
    }
}

/// Issue priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    /// Parse a raw priority string. Anything unrecognized is `Normal`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            _ => Priority::Normal,
        }
    }

    /// Strict variant for filter inputs, where a typo must not silently
    /// match `normal`.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "normal" => Some(Priority::Normal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Priority::parse(&s)).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_falls_back_to_user() {
        assert_eq!(Role::parse("moderator"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse(" Staff "), Role::Staff);
    }

    #[test]
    fn status_accepts_legacy_spellings() {
        assert_eq!(IssueStatus::parse("in progress"), Some(IssueStatus::InProgress));
        assert_eq!(IssueStatus::parse("In-Progress"), Some(IssueStatus::InProgress));
        assert_eq!(IssueStatus::parse("RESOLVED"), Some(IssueStatus::Resolved));
        assert_eq!(IssueStatus::parse("archived"), None);
    }

    #[test]
    fn status_serializes_canonical_hyphenated_form() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: IssueStatus = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(back, IssueStatus::InProgress);
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(Priority::parse("urgent"), Priority::Normal);
        assert_eq!(Priority::parse("HIGH"), Priority::High);
    }
}
