//! Fakes for the outbound ports.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::ports::{ApprovalRequest, GatewayError, NotificationGateway, PlateRecognizer, StatusUpdate};

#[derive(Default)]
pub struct RecordingNotifier {
    pub approval_requests: Mutex<Vec<ApprovalRequest>>,
    pub status_updates: Mutex<Vec<StatusUpdate>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn approval_count(&self) -> usize {
        self.approval_requests.lock().unwrap().len()
    }

    pub fn status_count(&self) -> usize {
        self.status_updates.lock().unwrap().len()
    }

    /// Secret embedded in the most recent approve link.
    pub fn last_secret(&self) -> Option<String> {
        self.approval_requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.approve_url.rsplit('/').next().map(str::to_string))
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn send_approval_request(&self, request: &ApprovalRequest) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Transport("smtp unreachable".into()));
        }
        self.approval_requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Transport("smtp unreachable".into()));
        }
        self.status_updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

pub enum FakeRecognizer {
    Detects(&'static str),
    Fails,
    Hangs,
}

#[async_trait]
impl PlateRecognizer for FakeRecognizer {
    async fn detect(&self, _image_ref: &str) -> Result<Option<String>, GatewayError> {
        match self {
            Self::Detects(plate) => Ok(Some(plate.to_string())),
            Self::Fails => Err(GatewayError::Transport("connection refused".into())),
            Self::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(None)
            }
        }
    }
}
