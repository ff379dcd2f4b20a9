//! Migration to create visitors table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Visitors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Visitors::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Visitors::VisitorName).string_len(255).not_null())
                    .col(ColumnDef::new(Visitors::VisitorPhone).string_len(50).not_null())
                    .col(ColumnDef::new(Visitors::VisitorAddress).string().not_null())
                    .col(ColumnDef::new(Visitors::VisitorEmail).string_len(255).null())
                    .col(ColumnDef::new(Visitors::OwnerName).string_len(255).not_null())
                    .col(ColumnDef::new(Visitors::OwnerEmail).string_len(255).not_null())
                    .col(ColumnDef::new(Visitors::OwnerMobile).string_len(50).not_null())
                    .col(ColumnDef::new(Visitors::FlatNo).string_len(50).not_null())
                    .col(ColumnDef::new(Visitors::Floor).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Visitors::BikeNumber)
                            .string_len(50)
                            .not_null()
                            .default("-"),
                    )
                    .col(ColumnDef::new(Visitors::BikeImageRef).string().null())
                    .col(ColumnDef::new(Visitors::VisitorImageRef).string().not_null())
                    .col(ColumnDef::new(Visitors::CapturedBy).string().not_null())
                    .col(ColumnDef::new(Visitors::SecurityEmail).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Visitors::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Visitors::ApprovedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Visitors::RejectedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Visitors::RejectionReason).string().null())
                    .col(
                        ColumnDef::new(Visitors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visitors_captured_by")
                            .from(Visitors::Table, Visitors::CapturedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visitors_created_at")
                    .table(Visitors::Table)
                    .col(Visitors::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visitors_captured_by")
                    .table(Visitors::Table)
                    .col(Visitors::CapturedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visitors_duplicate_key")
                    .table(Visitors::Table)
                    .col(Visitors::VisitorPhone)
                    .col(Visitors::OwnerEmail)
                    .col(Visitors::FlatNo)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Visitors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Visitors {
    Table,
    Id,
    VisitorName,
    VisitorPhone,
    VisitorAddress,
    VisitorEmail,
    OwnerName,
    OwnerEmail,
    OwnerMobile,
    FlatNo,
    Floor,
    BikeNumber,
    BikeImageRef,
    VisitorImageRef,
    CapturedBy,
    SecurityEmail,
    Status,
    ApprovedAt,
    RejectedAt,
    RejectionReason,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
