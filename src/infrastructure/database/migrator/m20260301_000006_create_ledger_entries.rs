//! Create ledger_entries table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Kind).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::TherapistId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::ParentId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::PaymentId).string())
                    .col(ColumnDef::new(LedgerEntries::BookingId).string())
                    .col(ColumnDef::new(LedgerEntries::Amount).big_integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::AppliedTo).string())
                    .col(ColumnDef::new(LedgerEntries::AppliedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_therapist")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::TherapistId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_parent")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::ParentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum LedgerEntries {
    Table,
    Id,
    Kind,
    TherapistId,
    ParentId,
    PaymentId,
    BookingId,
    Amount,
    AppliedTo,
    AppliedAt,
    CreatedAt,
    Version,
}
