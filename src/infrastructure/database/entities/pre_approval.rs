//! Pre-approval allow-list entry

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::pre_approval as domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PreApprovalKind {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "security")]
    Security,
}

impl From<domain::PreApprovalKind> for PreApprovalKind {
    fn from(kind: domain::PreApprovalKind) -> Self {
        match kind {
            domain::PreApprovalKind::Admin => Self::Admin,
            domain::PreApprovalKind::Security => Self::Security,
        }
    }
}

impl From<PreApprovalKind> for domain::PreApprovalKind {
    fn from(kind: PreApprovalKind) -> Self {
        match kind {
            PreApprovalKind::Admin => Self::Admin,
            PreApprovalKind::Security => Self::Security,
        }
    }
}

/// One row per `(kind, email)`; a unique index enforces it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pre_approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: PreApprovalKind,
    pub email: String,
    pub used: bool,
    pub added_by: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for domain::PreApprovalEntry {
    fn from(m: Model) -> Self {
        Self {
            kind: m.kind.into(),
            email: m.email,
            used: m.used,
            added_by: m.added_by,
            added_at: m.added_at,
        }
    }
}
