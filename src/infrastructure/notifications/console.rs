//! Log-only notification gateway for development

use async_trait::async_trait;
use tracing::info;

use super::templates::{self, RenderedEmail};
use crate::application::ports::{ApprovalRequest, GatewayError, NotificationGateway, StatusUpdate};

/// Writes every email to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotificationGateway;

impl LogNotificationGateway {
    pub fn new() -> Self {
        Self
    }

    fn log(&self, email: RenderedEmail) {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email not sent, no mail server configured"
        );
    }
}

#[async_trait]
impl NotificationGateway for LogNotificationGateway {
    async fn send_approval_request(&self, request: &ApprovalRequest) -> Result<(), GatewayError> {
        self.log(templates::approval_request(request));
        Ok(())
    }

    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), GatewayError> {
        self.log(templates::status_update(update));
        Ok(())
    }
}
