//! Approval token sweep
//!
//! Removes approval tokens past their expiry. Expired tokens are already
//! unusable; the sweep only keeps the table from growing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::shutdown::ShutdownSignal;

pub struct TokenSweeper {
    repos: Arc<dyn RepositoryProvider>,
    interval: Duration,
}

impl TokenSweeper {
    pub fn new(repos: Arc<dyn RepositoryProvider>, interval: Duration) -> Self {
        Self { repos, interval }
    }

    /// Delete every expired token once.
    pub async fn sweep_once(&self) -> DomainResult<u64> {
        let removed = self.repos.approval_tokens().delete_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Expired approval tokens removed");
        } else {
            debug!("No expired approval tokens");
        }
        Ok(removed)
    }

    /// Run the sweep on an interval until shutdown.
    pub fn start(self, shutdown: ShutdownSignal) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Approval token sweep started");
            let mut interval = tokio::time::interval(self.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            warn!(error = %e, "Approval token sweep failed");
                        }
                    }
                    _ = shutdown.wait() => {
                        info!("Approval token sweep shutting down");
                        break;
                    }
                }
            }
        })
    }
}
