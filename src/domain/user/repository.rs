use async_trait::async_trait;

use super::{NewUser, User};
use crate::domain::pre_approval::PreApprovalKind;
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    /// Store a new account. With `consume` set, the matching unused
    /// pre-approval entry is marked used in the same unit of work; the call
    /// fails with `NotPreApproved` when no such entry exists and with
    /// `DuplicateEmail` when the email is taken. Neither failure leaves
    /// partial state behind.
    async fn create(&self, user: NewUser, consume: Option<PreApprovalKind>) -> DomainResult<User>;

    /// Insert an operator account or refresh its name and password hash.
    /// Fails with `DuplicateEmail` if the email belongs to a non-operator.
    async fn upsert_operator(&self, user: NewUser) -> DomainResult<User>;
}
