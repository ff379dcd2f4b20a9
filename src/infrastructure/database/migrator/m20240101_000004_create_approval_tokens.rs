//! Migration to create approval_tokens table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApprovalTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalTokens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApprovalTokens::TokenHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ApprovalTokens::VisitorId).string().not_null())
                    .col(
                        ColumnDef::new(ApprovalTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_tokens_visitor")
                            .from(ApprovalTokens::Table, ApprovalTokens::VisitorId)
                            .to(Visitors::Table, Visitors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_tokens_expires_at")
                    .table(ApprovalTokens::Table)
                    .col(ApprovalTokens::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApprovalTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApprovalTokens {
    Table,
    Id,
    TokenHash,
    VisitorId,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Visitors {
    Table,
    Id,
}
