//! Create time_slots table
//!
//! `(therapist_id, date, start_time)` is unique so bulk generation can skip
//! existing rows with ON CONFLICT DO NOTHING.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimeSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimeSlots::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TimeSlots::TherapistId).string().not_null())
                    .col(ColumnDef::new(TimeSlots::Date).date().not_null())
                    .col(ColumnDef::new(TimeSlots::DayOfWeek).integer().not_null())
                    .col(ColumnDef::new(TimeSlots::StartTime).time().not_null())
                    .col(ColumnDef::new(TimeSlots::EndTime).time().not_null())
                    .col(
                        ColumnDef::new(TimeSlots::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::IsHoliday)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::IsBufferBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::MaxCapacity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::CurrentBookings)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_time_slots_therapist_date_start")
                    .table(TimeSlots::Table)
                    .col(TimeSlots::TherapistId)
                    .col(TimeSlots::Date)
                    .col(TimeSlots::StartTime)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_slots_date")
                    .table(TimeSlots::Table)
                    .col(TimeSlots::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_slots_day_of_week")
                    .table(TimeSlots::Table)
                    .col(TimeSlots::DayOfWeek)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TimeSlots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum TimeSlots {
    Table,
    Id,
    TherapistId,
    Date,
    DayOfWeek,
    StartTime,
    EndTime,
    IsAvailable,
    IsHoliday,
    IsBufferBlocked,
    MaxCapacity,
    CurrentBookings,
    CreatedAt,
}
