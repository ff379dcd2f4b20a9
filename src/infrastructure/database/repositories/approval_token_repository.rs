//! SeaORM implementation of ApprovalTokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::approval_token::{ApprovalToken, ApprovalTokenRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::approval_token;

pub struct SeaOrmApprovalTokenRepository {
    db: DatabaseConnection,
}

impl SeaOrmApprovalTokenRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApprovalTokenRepository for SeaOrmApprovalTokenRepository {
    async fn insert(&self, token: ApprovalToken) -> DomainResult<()> {
        approval_token::ActiveModel {
            id: Set(token.id),
            token_hash: Set(token.token_hash),
            visitor_id: Set(token.visitor_id),
            expires_at: Set(token.expires_at),
            created_at: Set(token.created_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn find_active(&self, token_hash: &str, now: DateTime<Utc>) -> DomainResult<Option<ApprovalToken>> {
        let model = approval_token::Entity::find()
            .filter(approval_token::Column::TokenHash.eq(token_hash))
            .filter(approval_token::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let result = approval_token::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let result = approval_token::Entity::delete_many()
            .filter(approval_token::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
