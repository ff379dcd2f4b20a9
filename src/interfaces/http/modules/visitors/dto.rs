//! Visitor DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Visitor;

/// Path under which stored images are served.
pub fn upload_path(image_ref: &str) -> String {
    format!("/uploads/{}", image_ref)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorDto {
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
    pub bike_number_image: Option<String>,
    pub visitor_image: String,
    pub captured_by: String,
    pub security_email: String,
    /// `pending`, `approved` or `rejected`
    pub status: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Visitor> for VisitorDto {
    fn from(v: Visitor) -> Self {
        Self {
            id: v.id,
            visitor_name: v.details.visitor_name,
            visitor_phone: v.details.visitor_phone,
            visitor_address: v.details.visitor_address,
            visitor_email: v.details.visitor_email,
            owner_name: v.details.owner_name,
            owner_email: v.details.owner_email,
            owner_mobile: v.details.owner_mobile,
            flat_no: v.details.flat_no,
            floor: v.details.floor,
            bike_number: v.bike_number,
            bike_number_image: v.bike_image_ref.as_deref().map(upload_path),
            visitor_image: upload_path(&v.visitor_image_ref),
            captured_by: v.captured_by,
            security_email: v.security_email,
            status: v.status.as_str().to_string(),
            approved_at: v.approved_at,
            rejected_at: v.rejected_at,
            rejection_reason: v.rejection_reason,
            created_at: v.created_at,
        }
    }
}

/// Multipart body of `POST /api/visitors`, documented for OpenAPI only.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct VisitorForm {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_address: String,
    pub visitor_email: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_mobile: String,
    pub flat_no: String,
    pub floor: String,
    /// Typed plate, used when recognition finds nothing
    pub bike_number: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub visitor_image: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub bike_number_image: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RejectParams {
    /// Optional reason shown to security
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisitorListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<VisitorDto>,
}
