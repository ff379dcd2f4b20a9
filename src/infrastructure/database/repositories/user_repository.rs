//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::domain::pre_approval::PreApprovalKind;
use crate::domain::user::{NewUser, User, UserRepository, UserRole};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{pre_approval, user};
use crate::infrastructure::database::is_unique_violation;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn new_active_model(new_user: NewUser) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        name: Set(new_user.name),
        email: Set(new_user.email),
        password_hash: Set(new_user.password_hash),
        role: Set(new_user.role.into()),
        created_at: Set(Utc::now()),
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn create(&self, new_user: NewUser, consume: Option<PreApprovalKind>) -> DomainResult<User> {
        let email = new_user.email.clone();
        let txn = self.db.begin().await?;

        if let Some(kind) = consume {
            let result = pre_approval::Entity::update_many()
                .col_expr(pre_approval::Column::Used, Expr::value(true))
                .filter(pre_approval::Column::Kind.eq(pre_approval::PreApprovalKind::from(kind)))
                .filter(pre_approval::Column::Email.eq(email.as_str()))
                .filter(pre_approval::Column::Used.eq(false))
                .exec(&txn)
                .await?;

            if result.rows_affected != 1 {
                debug!(email = %email, kind = kind.as_str(), "No unused pre-approval entry");
                return Err(DomainError::NotPreApproved {
                    email,
                    role: new_user.role.to_string(),
                });
            }
        }

        let model = new_active_model(new_user).insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateEmail(email.clone())
            } else {
                e.into()
            }
        })?;

        txn.commit().await?;
        Ok(model.into())
    }

    async fn upsert_operator(&self, new_user: NewUser) -> DomainResult<User> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(new_user.email.as_str()))
            .one(&self.db)
            .await?;

        match existing {
            Some(model) if model.role != user::UserRole::SuperAdmin => {
                Err(DomainError::DuplicateEmail(new_user.email))
            }
            Some(model) => {
                let mut active: user::ActiveModel = model.into();
                active.name = Set(new_user.name);
                active.password_hash = Set(new_user.password_hash);
                Ok(active.update(&self.db).await?.into())
            }
            None => {
                let mut active = new_active_model(new_user);
                active.role = Set(UserRole::SuperAdmin.into());
                Ok(active.insert(&self.db).await?.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pre_approval::{PreApprovalEntry, PreApprovalRepository};
    use crate::infrastructure::database::repositories::pre_approval_repository::SeaOrmPreApprovalRepository;
    use crate::infrastructure::database::test_connection;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
        }
    }

    async fn allow(db: &DatabaseConnection, kind: PreApprovalKind, email: &str) {
        SeaOrmPreApprovalRepository::new(db.clone())
            .insert_if_absent(PreApprovalEntry::new(kind, email.into(), None, Utc::now()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_consumes_pre_approval_once() {
        let db = test_connection().await;
        let repo = SeaOrmUserRepository::new(db.clone());
        allow(&db, PreApprovalKind::Security, "guard@example.com").await;

        let user = repo
            .create(new_user("guard@example.com", UserRole::Security), Some(PreApprovalKind::Security))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Security);

        let entry = SeaOrmPreApprovalRepository::new(db.clone())
            .find(PreApprovalKind::Security, "guard@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(entry.used);

        let err = repo
            .create(new_user("guard@example.com", UserRole::Security), Some(PreApprovalKind::Security))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPreApproved { .. }));
    }

    #[tokio::test]
    async fn create_without_entry_for_role_fails() {
        let db = test_connection().await;
        let repo = SeaOrmUserRepository::new(db.clone());
        allow(&db, PreApprovalKind::Security, "boss@example.com").await;

        let err = repo
            .create(new_user("boss@example.com", UserRole::Admin), Some(PreApprovalKind::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPreApproved { .. }));
        assert!(repo.find_by_email("boss@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_rolls_back_consumption() {
        let db = test_connection().await;
        let repo = SeaOrmUserRepository::new(db.clone());
        repo.create(new_user("dup@example.com", UserRole::Admin), None)
            .await
            .unwrap();
        allow(&db, PreApprovalKind::Admin, "dup@example.com").await;

        let err = repo
            .create(new_user("dup@example.com", UserRole::Admin), Some(PreApprovalKind::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEmail(_)));

        let entry = SeaOrmPreApprovalRepository::new(db)
            .find(PreApprovalKind::Admin, "dup@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(!entry.used);
    }

    #[tokio::test]
    async fn upsert_operator_refreshes_hash() {
        let db = test_connection().await;
        let repo = SeaOrmUserRepository::new(db);

        let first = repo
            .upsert_operator(new_user("root@example.com", UserRole::SuperAdmin))
            .await
            .unwrap();
        let mut again = new_user("root@example.com", UserRole::SuperAdmin);
        again.password_hash = "other".into();
        let second = repo.upsert_operator(again).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.password_hash, "other");
        assert_eq!(second.role, UserRole::SuperAdmin);
    }

    #[tokio::test]
    async fn upsert_operator_refuses_regular_account() {
        let db = test_connection().await;
        let repo = SeaOrmUserRepository::new(db);
        repo.create(new_user("taken@example.com", UserRole::Security), None)
            .await
            .unwrap();

        let err = repo
            .upsert_operator(new_user("taken@example.com", UserRole::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEmail(_)));
    }
}
