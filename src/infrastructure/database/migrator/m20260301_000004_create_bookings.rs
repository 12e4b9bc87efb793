//! Create bookings table

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_time_slots::TimeSlots;
use super::m20260301_000003_create_payments::Payments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::PaymentId).string().not_null())
                    .col(ColumnDef::new(Bookings::GroupKey).string().not_null())
                    .col(ColumnDef::new(Bookings::ParentId).string().not_null())
                    .col(ColumnDef::new(Bookings::TherapistId).string().not_null())
                    .col(ColumnDef::new(Bookings::ChildId).string().not_null())
                    .col(ColumnDef::new(Bookings::SlotId).string().not_null())
                    .col(ColumnDef::new(Bookings::SessionNumber).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::FeeShare).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("PENDING_CONFIRMATION"),
                    )
                    .col(
                        ColumnDef::new(Bookings::RefundAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::TherapistNote).string())
                    .col(ColumnDef::new(Bookings::CancelledBy).string())
                    .col(ColumnDef::new(Bookings::CancelledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bookings::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_payment")
                            .from(Bookings::Table, Bookings::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_time_slot")
                            .from(Bookings::Table, Bookings::SlotId)
                            .to(TimeSlots::Table, TimeSlots::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_bookings_group_session")
                    .table(Bookings::Table)
                    .col(Bookings::GroupKey)
                    .col(Bookings::SessionNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_parent")
                    .table(Bookings::Table)
                    .col(Bookings::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_therapist")
                    .table(Bookings::Table)
                    .col(Bookings::TherapistId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    PaymentId,
    GroupKey,
    ParentId,
    TherapistId,
    ChildId,
    SlotId,
    SessionNumber,
    ScheduledAt,
    FeeShare,
    Status,
    RefundAmount,
    TherapistNote,
    CancelledBy,
    CancelledAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
    Version,
}
