//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::approval_token::ApprovalTokenRepository;
use super::pre_approval::PreApprovalRepository;
use super::user::UserRepository;
use super::visitor::VisitorRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let user = repos.users().find_by_email("guard@example.com").await?;
///     let visitors = repos.visitors().list_by_captor(&user.id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn pre_approvals(&self) -> &dyn PreApprovalRepository;
    fn visitors(&self) -> &dyn VisitorRepository;
    fn approval_tokens(&self) -> &dyn ApprovalTokenRepository;
}
