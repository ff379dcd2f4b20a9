//! Domain error to HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::DomainError;

/// Handler error. Internal detail is logged and replaced with a generic
/// message before it reaches the client.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(DomainError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_)
            | DomainError::DuplicateEmail(_)
            | DomainError::DuplicateVisitor
            | DomainError::NotPreApproved { .. }
            | DomainError::InvalidOrExpiredToken
            | DomainError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            DomainError::InvalidCredentials | DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            DomainError::Validation(_) => "validation_error",
            DomainError::DuplicateEmail(_) => "duplicate_email",
            DomainError::DuplicateVisitor => "duplicate_visitor",
            DomainError::NotPreApproved { .. } => "not_pre_approved",
            DomainError::InvalidCredentials => "invalid_credentials",
            DomainError::Unauthorized(_) => "unauthorized",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::InvalidOrExpiredToken | DomainError::InvalidTransition { .. } => {
                "invalid_or_expired_token"
            }
            DomainError::NotFound { .. } => "not_found",
            DomainError::DependencyUnavailable(_) => "service_unavailable",
            DomainError::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match &self.0 {
            DomainError::Validation(msg) => msg.clone(),
            DomainError::Unauthorized(msg) | DomainError::Forbidden(msg) => msg.clone(),
            // Token callers cannot tell a resolved visitor from a bad token.
            DomainError::InvalidTransition { .. } => DomainError::InvalidOrExpiredToken.to_string(),
            DomainError::NotFound { entity, .. } => format!("{} not found", entity),
            DomainError::DependencyUnavailable(_) => "Service temporarily unavailable".to_string(),
            DomainError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            error!(error = %self.0, "Request failed");
        }

        let status = self.status();
        let body = ApiResponse::<()>::error(self.client_message()).with_code(self.code());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status() {
        assert_eq!(ApiError(DomainError::DuplicateVisitor).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(DomainError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError(DomainError::Forbidden("x".into())).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError(DomainError::not_found("User", "id", "u-1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(DomainError::Internal("disk".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError(DomainError::Internal("Database error: no such table: visitors".into()));
        assert_eq!(err.client_message(), "Internal server error");

        let err = ApiError(DomainError::DependencyUnavailable("email: smtp.example.com refused".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.client_message(), "Service temporarily unavailable");
    }

    #[test]
    fn resolved_visitor_reads_as_bad_token() {
        let err = ApiError(DomainError::InvalidTransition {
            from: "approved".into(),
            to: "rejected".into(),
        });
        assert_eq!(err.code(), "invalid_or_expired_token");
        assert_eq!(err.client_message(), "Invalid or expired token");
    }
}
