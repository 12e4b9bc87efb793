//! Create payments table
//!
//! Money columns are whole currency units. `version` backs optimistic
//! concurrency on every update.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::ParentId).string().not_null())
                    .col(ColumnDef::new(Payments::TherapistId).string().not_null())
                    .col(ColumnDef::new(Payments::ChildId).string().not_null())
                    .col(ColumnDef::new(Payments::SessionType).string().not_null())
                    .col(ColumnDef::new(Payments::TotalSessions).integer().not_null())
                    .col(ColumnDef::new(Payments::OriginalFee).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::DiscountRate)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Payments::FinalFee).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::RefundedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Payments::Status)
                            .string()
                            .not_null()
                            .default("PENDING_PAYMENT"),
                    )
                    .col(
                        ColumnDef::new(Payments::CompletedSessions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Payments::PaidAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Payments::SettlementAmount).big_integer())
                    .col(ColumnDef::new(Payments::SettledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Payments::SettlementNote).string())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::Version)
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
                    .name("idx_payments_parent")
                    .table(Payments::Table)
                    .col(Payments::ParentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Payments {
    Table,
    Id,
    ParentId,
    TherapistId,
    ChildId,
    SessionType,
    TotalSessions,
    OriginalFee,
    DiscountRate,
    FinalFee,
    RefundedAmount,
    Status,
    CompletedSessions,
    PaidAt,
    SettlementAmount,
    SettledAt,
    SettlementNote,
    CreatedAt,
    UpdatedAt,
    Version,
}
