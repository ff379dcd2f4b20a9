use async_trait::async_trait;

use super::{PreApprovalEntry, PreApprovalKind};
use crate::domain::DomainResult;

#[async_trait]
pub trait PreApprovalRepository: Send + Sync {
    /// Insert the entry unless `(kind, email)` is already present.
    /// Returns `false` when it was present; the stored entry is untouched.
    async fn insert_if_absent(&self, entry: PreApprovalEntry) -> DomainResult<bool>;

    async fn find(&self, kind: PreApprovalKind, email: &str) -> DomainResult<Option<PreApprovalEntry>>;
}
