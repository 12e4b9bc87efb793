//! Create refund_requests table

use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_payments::Payments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RefundRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RefundRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RefundRequests::PaymentId).string().not_null())
                    .col(ColumnDef::new(RefundRequests::BookingId).string())
                    .col(ColumnDef::new(RefundRequests::ParentId).string().not_null())
                    .col(
                        ColumnDef::new(RefundRequests::RequestedAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RefundRequests::Reason).string().not_null())
                    .col(
                        ColumnDef::new(RefundRequests::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(RefundRequests::ResolvedBy).string())
                    .col(ColumnDef::new(RefundRequests::ResolvedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RefundRequests::ResolutionNote).string())
                    .col(
                        ColumnDef::new(RefundRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RefundRequests::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refund_requests_payment")
                            .from(RefundRequests::Table, RefundRequests::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_refund_requests_status")
                    .table(RefundRequests::Table)
                    .col(RefundRequests::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RefundRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RefundRequests {
    Table,
    Id,
    PaymentId,
    BookingId,
    ParentId,
    RequestedAmount,
    Reason,
    Status,
    ResolvedBy,
    ResolvedAt,
    ResolutionNote,
    CreatedAt,
    Version,
}
