//! Outbound ports
//!
//! Every call through these traits is treated as best-effort by the
//! services, except [`ImageStore::save`] which the HTTP layer needs before a
//! submission can be accepted.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Visitor;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Approval email for the flat owner.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub visitor: Visitor,
    pub approve_url: String,
    pub reject_url: String,
    pub photo_url: String,
}

/// Outcome email for the submitting security user.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub visitor: Visitor,
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_approval_request(&self, request: &ApprovalRequest) -> Result<(), GatewayError>;
    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), GatewayError>;
}

/// Plate-number detection on a stored bike image.
#[async_trait]
pub trait PlateRecognizer: Send + Sync {
    /// `Ok(None)` when the service ran but found nothing usable.
    async fn detect(&self, image_ref: &str) -> Result<Option<String>, GatewayError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an image and return its opaque reference.
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<String, GatewayError>;
    async fn load(&self, image_ref: &str) -> Result<Vec<u8>, GatewayError>;
}
