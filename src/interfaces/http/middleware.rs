//! Authentication middleware for Axum
//!
//! [`auth_middleware`] turns a bearer token into an [`Identity`] stored in
//! the request extensions. [`require_capability`] runs after it and checks
//! the identity's role against the capability a route declares.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::common::ApiError;
use crate::domain::{Capability, DomainError, Identity};
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig};

#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    InsufficientPermissions,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let err = match self {
            Self::MissingToken => DomainError::Unauthorized("Missing authentication token".into()),
            Self::InvalidToken => DomainError::Unauthorized("Invalid or expired session".into()),
            Self::InsufficientPermissions => DomainError::Forbidden("Insufficient permissions".into()),
        };
        ApiError(err).into_response()
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return AuthError::MissingToken.into_response();
    };

    let Some(token) = extract_token(auth_header) else {
        return AuthError::InvalidToken.into_response();
    };

    let identity = match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => claims.identity(),
        Err(e) => {
            debug!(error = %e, "Rejected session token");
            None
        }
    };

    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => AuthError::InvalidToken.into_response(),
    }
}

/// Capability gate. Mount inside [`auth_middleware`].
pub async fn require_capability(
    State(capability): State<Capability>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(identity) = request.extensions().get::<Identity>() else {
        return AuthError::MissingToken.into_response();
    };

    if !identity.role.allows(capability) {
        debug!(user_id = %identity.id, role = %identity.role, ?capability, "Capability denied");
        return AuthError::InsufficientPermissions.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("Basic abc"), None);
    }
}
