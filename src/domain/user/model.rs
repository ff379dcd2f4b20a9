//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something a request may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SubmitVisitors,
    ViewOwnVisitors,
    ViewReports,
    ManageSecurityAllowList,
    ManageAdminAllowList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Security,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Security => "security",
            Self::SuperAdmin => "super_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "security" => Some(Self::Security),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Self::Security => &[SubmitVisitors, ViewOwnVisitors],
            Self::Admin => &[ViewReports, ManageSecurityAllowList],
            Self::SuperAdmin => &[ViewReports, ManageSecurityAllowList, ManageAdminAllowList],
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Operator accounts are provisioned from configuration only.
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, Self::SuperAdmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Always stored normalized (trimmed, lower-cased).
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Account about to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Identity claim issued after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
