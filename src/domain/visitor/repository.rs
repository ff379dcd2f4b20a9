use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Decision, DuplicateKey, Visitor, VisitorFilter};
use crate::domain::DomainResult;
use crate::shared::pagination::PageRequest;

#[async_trait]
pub trait VisitorRepository: Send + Sync {
    async fn insert(&self, visitor: Visitor) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Visitor>>;

    /// Store `visitor` unless a visitor matching `key` exists.
    ///
    /// The check and the write are one atomic step. Returns `false`, storing
    /// nothing, when a duplicate was found.
    async fn insert_unless_duplicate(&self, visitor: Visitor, key: &DuplicateKey) -> DomainResult<bool>;

    /// Move a pending visitor to the decision's terminal state.
    ///
    /// Conditional on the stored status still being `pending`; returns the
    /// updated visitor, or `None` if it was missing or already resolved.
    async fn transition(&self, id: &str, decision: &Decision, at: DateTime<Utc>) -> DomainResult<Option<Visitor>>;

    /// All visitors submitted by one security user, newest first.
    async fn list_by_captor(&self, user_id: &str) -> DomainResult<Vec<Visitor>>;

    /// Filtered visitors, newest first, with the total match count.
    /// `page = None` returns every match.
    async fn query(&self, filter: &VisitorFilter, page: Option<PageRequest>) -> DomainResult<(Vec<Visitor>, u64)>;

    async fn count(&self, filter: &VisitorFilter) -> DomainResult<u64>;
}
