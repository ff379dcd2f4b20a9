//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::approval_token::ApprovalTokenRepository;
use crate::domain::pre_approval::PreApprovalRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::user::UserRepository;
use crate::domain::visitor::VisitorRepository;

use super::approval_token_repository::SeaOrmApprovalTokenRepository;
use super::pre_approval_repository::SeaOrmPreApprovalRepository;
use super::user_repository::SeaOrmUserRepository;
use super::visitor_repository::SeaOrmVisitorRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let user = repos.users().find_by_email("guard@example.com").await?;
/// let mine = repos.visitors().list_by_captor(&user.id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    users: SeaOrmUserRepository,
    pre_approvals: SeaOrmPreApprovalRepository,
    visitors: SeaOrmVisitorRepository,
    approval_tokens: SeaOrmApprovalTokenRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            pre_approvals: SeaOrmPreApprovalRepository::new(db.clone()),
            visitors: SeaOrmVisitorRepository::new(db.clone()),
            approval_tokens: SeaOrmApprovalTokenRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn pre_approvals(&self) -> &dyn PreApprovalRepository {
        &self.pre_approvals
    }

    fn visitors(&self) -> &dyn VisitorRepository {
        &self.visitors
    }

    fn approval_tokens(&self) -> &dyn ApprovalTokenRepository {
        &self.approval_tokens
    }
}
