//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_pre_approvals;
mod m20240101_000003_create_visitors;
mod m20240101_000004_create_approval_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_pre_approvals::Migration),
            Box::new(m20240101_000003_create_visitors::Migration),
            Box::new(m20240101_000004_create_approval_tokens::Migration),
        ]
    }
}
