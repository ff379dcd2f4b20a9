//! Migration to create pre_approvals table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PreApprovals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PreApprovals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PreApprovals::Kind).string_len(20).not_null())
                    .col(ColumnDef::new(PreApprovals::Email).string_len(255).not_null())
                    .col(
                        ColumnDef::new(PreApprovals::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PreApprovals::AddedBy).string_len(255).null())
                    .col(
                        ColumnDef::new(PreApprovals::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pre_approvals_kind_email")
                    .table(PreApprovals::Table)
                    .col(PreApprovals::Kind)
                    .col(PreApprovals::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PreApprovals::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PreApprovals {
    Table,
    Id,
    Kind,
    Email,
    Used,
    AddedBy,
    AddedAt,
}
