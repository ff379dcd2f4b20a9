//! Pre-approval allow-lists gating self-registration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserRole;

/// Which allow-list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreApprovalKind {
    Admin,
    Security,
}

impl PreApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Security => "security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    /// The allow-list a self-registering role must be found on.
    pub fn for_role(role: UserRole) -> Option<Self> {
        match role {
            UserRole::Admin => Some(Self::Admin),
            UserRole::Security => Some(Self::Security),
            UserRole::SuperAdmin => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreApprovalEntry {
    pub kind: PreApprovalKind,
    pub email: String,
    pub used: bool,
    /// Only recorded on security entries.
    pub added_by: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl PreApprovalEntry {
    pub fn new(kind: PreApprovalKind, email: String, added_by: Option<String>, now: DateTime<Utc>) -> Self {
        let added_by = match kind {
            PreApprovalKind::Security => added_by,
            PreApprovalKind::Admin => None,
        };
        Self {
            kind,
            email,
            used: false,
            added_by,
            added_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddStatus {
    Added,
    AlreadyExists,
    Error,
}

/// Result of adding one email to an allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub email: String,
    pub status: AddStatus,
    pub error: Option<String>,
}

impl AddOutcome {
    pub fn added(email: String) -> Self {
        Self { email, status: AddStatus::Added, error: None }
    }

    pub fn already_exists(email: String) -> Self {
        Self { email, status: AddStatus::AlreadyExists, error: None }
    }

    pub fn error(email: String, error: impl Into<String>) -> Self {
        Self { email, status: AddStatus::Error, error: Some(error.into()) }
    }
}
