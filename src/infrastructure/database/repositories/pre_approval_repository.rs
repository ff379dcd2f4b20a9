//! SeaORM implementation of PreApprovalRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::pre_approval::{PreApprovalEntry, PreApprovalKind, PreApprovalRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::pre_approval;

pub struct SeaOrmPreApprovalRepository {
    db: DatabaseConnection,
}

impl SeaOrmPreApprovalRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreApprovalRepository for SeaOrmPreApprovalRepository {
    async fn insert_if_absent(&self, entry: PreApprovalEntry) -> DomainResult<bool> {
        let model = pre_approval::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            kind: Set(entry.kind.into()),
            email: Set(entry.email),
            used: Set(entry.used),
            added_by: Set(entry.added_by),
            added_at: Set(entry.added_at),
        };

        let inserted = pre_approval::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([pre_approval::Column::Kind, pre_approval::Column::Email])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted == 1)
    }

    async fn find(&self, kind: PreApprovalKind, email: &str) -> DomainResult<Option<PreApprovalEntry>> {
        let model = pre_approval::Entity::find()
            .filter(pre_approval::Column::Kind.eq(pre_approval::PreApprovalKind::from(kind)))
            .filter(pre_approval::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }
}
