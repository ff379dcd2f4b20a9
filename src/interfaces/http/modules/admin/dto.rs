//! Admin DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{DashboardStats, ReportQuery};
use crate::domain::{AddOutcome, VisitorStatus};
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::modules::visitors::VisitorDto;
use crate::shared::validations::non_blank;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    /// Created in the trailing hour
    pub current_hour: u64,
    pub last_updated: DateTime<Utc>,
}

impl DashboardDto {
    pub fn new(stats: DashboardStats, at: DateTime<Utc>) -> Self {
        Self {
            total: stats.total,
            pending: stats.pending,
            approved: stats.approved,
            rejected: stats.rejected,
            current_hour: stats.current_hour,
            last_updated: at,
        }
    }
}

/// Filters shared by the visitor list and the export.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VisitorQueryParams {
    /// First day, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Last day, `YYYY-MM-DD`, inclusive
    pub end_date: Option<String>,
    /// `pending`, `approved`, `rejected` or `all`
    pub status: Option<String>,
    /// Case-insensitive match on visitor name or phone, owner, flat, bike number
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Export only: `csv` (default) or `json`
    pub format: Option<String>,
}

fn parse_day(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| ApiError::validation(format!("{} must be a date in YYYY-MM-DD format", field)))
        })
        .transpose()
}

impl VisitorQueryParams {
    pub fn report_query(&self) -> Result<ReportQuery, ApiError> {
        Ok(ReportQuery {
            start_date: parse_day("startDate", self.start_date.as_deref())?,
            end_date: parse_day("endDate", self.end_date.as_deref())?,
            status: VisitorStatus::parse_filter(self.status.as_deref())?,
            search: non_blank(self.search.as_deref()).map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub success: bool,
    pub data: Vec<VisitorDto>,
    pub exported_at: DateTime<Utc>,
    pub total: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddAdminEmailsRequest {
    #[validate(length(min = 1, message = "Emails array is required"))]
    pub emails: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSecurityEmailsRequest {
    #[validate(length(min = 1, message = "Security emails array is required"))]
    pub security_emails: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddEmailResult {
    pub email: String,
    /// `added`, `already_exists` or `error`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AddOutcome> for AddEmailResult {
    fn from(outcome: AddOutcome) -> Self {
        let status = serde_json::to_value(outcome.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            email: outcome.email,
            status,
            error: outcome.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_ignored() {
        let params = VisitorQueryParams {
            start_date: Some("".into()),
            status: Some("all".into()),
            search: Some("  ".into()),
            ..Default::default()
        };
        let query = params.report_query().unwrap();
        assert!(query.start_date.is_none());
        assert!(query.status.is_none());
        assert!(query.search.is_none());
    }

    #[test]
    fn bad_date_is_a_validation_error() {
        let params = VisitorQueryParams {
            end_date: Some("12/06/2024".into()),
            ..Default::default()
        };
        let err = params.report_query().unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn outcome_status_uses_wire_names() {
        let result = AddEmailResult::from(AddOutcome::already_exists("a@x.com".into()));
        assert_eq!(result.status, "already_exists");
    }
}
