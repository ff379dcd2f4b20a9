//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::info;

use super::dto::{AuthResponse, LoginRequest, RegisterRequest, UserInfo};
use crate::application::{CredentialService, RegisterCommand};
use crate::domain::{Identity, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};

#[derive(Clone)]
pub struct AuthHandlerState {
    pub credentials: Arc<CredentialService>,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error, duplicate email or email not pre-approved")
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let role = UserRole::parse(&request.role)
        .filter(UserRole::is_self_registrable)
        .ok_or_else(|| ApiError::validation("role must be admin or security"))?;

    let session = state
        .credentials
        .register(RegisterCommand {
            name: request.name,
            email: request.email,
            password: request.password,
            role,
        })
        .await?;

    info!(user_id = %session.user.id, role = %role, "Account registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(session.into()).with_message("Registration successful")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let session = state
        .credentials
        .authenticate(&request.email, &request.password)
        .await?;

    Ok(Json(ApiResponse::success(session.into())))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserInfo>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthHandlerState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.credentials.get_user(&identity).await?;
    Ok(Json(ApiResponse::success(user.into())))
}
