use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Visitor already exists with similar details")]
    DuplicateVisitor,

    #[error("Email {email} is not pre-approved for {role}")]
    NotPreApproved { email: String, role: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Cannot move visitor from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Failures the caller can do nothing about (storage, crypto, I/O).
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::DependencyUnavailable(_))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Internal(format!("Database error: {}", e))
    }
}
