//! Admin API handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use super::dto::{
    AddAdminEmailsRequest, AddEmailResult, AddSecurityEmailsRequest, DashboardDto, ExportResponse,
    VisitorQueryParams,
};
use crate::application::{CredentialService, ExportFormat, ReportingService};
use crate::domain::{Identity, PreApprovalKind};
use crate::interfaces::http::common::{ApiError, ApiResponse, PaginatedResponse, ValidatedJson};
use crate::interfaces::http::modules::visitors::VisitorDto;
use crate::shared::pagination::PageRequest;

#[derive(Clone)]
pub struct AdminHandlerState {
    pub reporting: Arc<ReportingService>,
    pub credentials: Arc<CredentialService>,
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Today's counters", body = ApiResponse<DashboardDto>),
        (status = 403, description = "Reports not permitted")
    )
)]
pub async fn get_dashboard(
    State(state): State<AdminHandlerState>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let now = Utc::now();
    let stats = state.reporting.compute_dashboard_stats_at(now).await?;
    Ok(Json(ApiResponse::success(DashboardDto::new(stats, now))))
}

#[utoipa::path(
    get,
    path = "/api/admin/visitors",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(VisitorQueryParams),
    responses(
        (status = 200, description = "One page of visitors, newest first", body = ApiResponse<PaginatedResponse<VisitorDto>>),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_visitors(
    State(state): State<AdminHandlerState>,
    Query(params): Query<VisitorQueryParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<VisitorDto>>>, ApiError> {
    let query = params.report_query()?;
    let page = PageRequest::new(params.page, params.limit);

    let result = state.reporting.query_visitors(&query, page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(result))))
}

#[utoipa::path(
    get,
    path = "/api/admin/export",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(VisitorQueryParams),
    responses(
        (status = 200, description = "CSV attachment or JSON document", content(
            (String = "text/csv"),
            (ExportResponse = "application/json")
        )),
        (status = 400, description = "Invalid filter or format")
    )
)]
pub async fn export_visitors(
    State(state): State<AdminHandlerState>,
    Query(params): Query<VisitorQueryParams>,
) -> Result<Response, ApiError> {
    let format = ExportFormat::parse(params.format.as_deref())
        .ok_or_else(|| ApiError::validation("format must be csv or json"))?;
    let query = params.report_query()?;

    let export = state.reporting.export_visitors(&query).await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename(format));

    let response = match format {
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            export.to_csv(),
        )
            .into_response(),
        ExportFormat::Json => {
            let total = export.visitors.len();
            let body = ExportResponse {
                success: true,
                data: export.visitors.into_iter().map(VisitorDto::from).collect(),
                exported_at: export.exported_at,
                total,
            };
            ([(header::CONTENT_DISPOSITION, disposition)], Json(body)).into_response()
        }
    };

    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/admin/add-admin-emails",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = AddAdminEmailsRequest,
    responses(
        (status = 200, description = "Per-email outcome", body = ApiResponse<Vec<AddEmailResult>>),
        (status = 403, description = "Only super admins manage the admin allow-list")
    )
)]
pub async fn add_admin_emails(
    State(state): State<AdminHandlerState>,
    ValidatedJson(request): ValidatedJson<AddAdminEmailsRequest>,
) -> Result<Json<ApiResponse<Vec<AddEmailResult>>>, ApiError> {
    let outcomes = state
        .credentials
        .add_pre_approvals(PreApprovalKind::Admin, &request.emails, None)
        .await?;

    Ok(Json(
        ApiResponse::success(outcomes.into_iter().map(AddEmailResult::from).collect())
            .with_message("Admin emails processed successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/add-security-emails",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = AddSecurityEmailsRequest,
    responses(
        (status = 200, description = "Per-email outcome", body = ApiResponse<Vec<AddEmailResult>>),
        (status = 403, description = "Security allow-list not permitted")
    )
)]
pub async fn add_security_emails(
    State(state): State<AdminHandlerState>,
    Extension(identity): Extension<Identity>,
    ValidatedJson(request): ValidatedJson<AddSecurityEmailsRequest>,
) -> Result<Json<ApiResponse<Vec<AddEmailResult>>>, ApiError> {
    let outcomes = state
        .credentials
        .add_pre_approvals(
            PreApprovalKind::Security,
            &request.security_emails,
            Some(identity.email.as_str()),
        )
        .await?;

    Ok(Json(
        ApiResponse::success(outcomes.into_iter().map(AddEmailResult::from).collect())
            .with_message("Security emails processed successfully"),
    ))
}
