//! Visitor API handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use super::dto::{RejectParams, VisitorDto, VisitorForm, VisitorListResponse};
use super::form::parse_submission;
use crate::application::visitors::service::EFFECT_APPROVAL_EMAIL;
use crate::application::{ImageStore, VisitorLifecycleService};
use crate::domain::{Decision, Identity};
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::shared::validations::non_blank;

#[derive(Clone)]
pub struct VisitorHandlerState {
    pub visitors: Arc<VisitorLifecycleService>,
    pub images: Arc<dyn ImageStore>,
}

#[utoipa::path(
    post,
    path = "/api/visitors",
    tag = "Visitors",
    security(("bearer_auth" = [])),
    request_body(content = VisitorForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Visitor recorded, approval email queued", body = ApiResponse<VisitorDto>),
        (status = 400, description = "Validation error or duplicate visitor"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not a security user")
    )
)]
pub async fn create_visitor(
    State(state): State<VisitorHandlerState>,
    Extension(identity): Extension<Identity>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<VisitorDto>>), ApiError> {
    let submission = parse_submission(multipart, state.images.as_ref()).await?;
    let outcome = state.visitors.submit(&identity, submission).await?;

    let email_sent = outcome
        .effect(EFFECT_APPROVAL_EMAIL)
        .is_some_and(|e| e.is_completed());
    let message = if email_sent {
        "Visitor created successfully. Approval email sent to owner."
    } else {
        "Visitor created successfully. Approval email could not be sent."
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(outcome.value.into()).with_message(message)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/visitors/approve/{token}",
    tag = "Visitors",
    params(("token" = String, Path, description = "Secret from the approval email")),
    responses(
        (status = 200, description = "Visitor approved", body = ApiResponse<VisitorDto>),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn approve_visitor(
    State(state): State<VisitorHandlerState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<VisitorDto>>, ApiError> {
    let outcome = state.visitors.resolve(&token, Decision::Approve).await?;
    info!(visitor_id = %outcome.value.id, "Visitor approved via link");
    Ok(Json(
        ApiResponse::success(outcome.value.into()).with_message("Visitor approved successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/api/visitors/reject/{token}",
    tag = "Visitors",
    params(
        ("token" = String, Path, description = "Secret from the approval email"),
        RejectParams
    ),
    responses(
        (status = 200, description = "Visitor rejected", body = ApiResponse<VisitorDto>),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn reject_visitor(
    State(state): State<VisitorHandlerState>,
    Path(token): Path<String>,
    Query(params): Query<RejectParams>,
) -> Result<Json<ApiResponse<VisitorDto>>, ApiError> {
    let reason = non_blank(params.reason.as_deref()).map(str::to_string);
    let outcome = state.visitors.resolve(&token, Decision::Reject { reason }).await?;
    info!(visitor_id = %outcome.value.id, "Visitor rejected via link");
    Ok(Json(
        ApiResponse::success(outcome.value.into()).with_message("Visitor rejected successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/api/visitors/security",
    tag = "Visitors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visitors submitted by the caller, newest first", body = VisitorListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not a security user")
    )
)]
pub async fn list_security_visitors(
    State(state): State<VisitorHandlerState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<VisitorListResponse>, ApiError> {
    let visitors = state.visitors.list_for_security(&identity.id).await?;
    let data: Vec<VisitorDto> = visitors.into_iter().map(VisitorDto::from).collect();

    Ok(Json(VisitorListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}
