use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ApprovalToken;
use crate::domain::DomainResult;

#[async_trait]
pub trait ApprovalTokenRepository: Send + Sync {
    async fn insert(&self, token: ApprovalToken) -> DomainResult<()>;

    /// Look up an unexpired token by the digest of its secret.
    async fn find_active(&self, token_hash: &str, now: DateTime<Utc>) -> DomainResult<Option<ApprovalToken>>;

    /// Idempotent; returns whether a row was removed.
    async fn delete(&self, id: &str) -> DomainResult<bool>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}
