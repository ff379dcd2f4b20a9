//! Visitor entity for database

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::visitor as domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum VisitorStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<domain::VisitorStatus> for VisitorStatus {
    fn from(status: domain::VisitorStatus) -> Self {
        match status {
            domain::VisitorStatus::Pending => Self::Pending,
            domain::VisitorStatus::Approved => Self::Approved,
            domain::VisitorStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<VisitorStatus> for domain::VisitorStatus {
    fn from(status: VisitorStatus) -> Self {
        match status {
            VisitorStatus::Pending => Self::Pending,
            VisitorStatus::Approved => Self::Approved,
            VisitorStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visitors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_address: String,
    pub visitor_email: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_mobile: String,
    pub flat_no: String,
    pub floor: String,
    /// `-` when unknown
    pub bike_number: String,
    pub bike_image_ref: Option<String>,
    pub visitor_image_ref: String,
    pub captured_by: String,
    pub security_email: String,
    pub status: VisitorStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CapturedBy",
        to = "super::user::Column::Id"
    )]
    CapturedBy,

    #[sea_orm(has_many = "super::approval_token::Entity")]
    ApprovalTokens,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CapturedBy.def()
    }
}

impl Related<super::approval_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for domain::Visitor {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            details: domain::VisitorDetails {
                visitor_name: m.visitor_name,
                visitor_phone: m.visitor_phone,
                visitor_address: m.visitor_address,
                visitor_email: m.visitor_email,
                owner_name: m.owner_name,
                owner_email: m.owner_email,
                owner_mobile: m.owner_mobile,
                flat_no: m.flat_no,
                floor: m.floor,
            },
            bike_number: m.bike_number,
            bike_image_ref: m.bike_image_ref,
            visitor_image_ref: m.visitor_image_ref,
            captured_by: m.captured_by,
            security_email: m.security_email,
            status: m.status.into(),
            approved_at: m.approved_at,
            rejected_at: m.rejected_at,
            rejection_reason: m.rejection_reason,
            created_at: m.created_at,
        }
    }
}
