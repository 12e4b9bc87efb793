//! SeaORM implementation of SlotRepository

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use log::debug;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::domain::slot::{Holiday, SlotFlags, SlotQuery, SlotRepository, TimeSlot};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{holiday, time_slot};

/// Rows per multi-row INSERT; keeps generated statements under SQLite's
/// bound-parameter limit.
const INSERT_CHUNK: usize = 200;

pub struct SeaOrmSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn weekday_index(day: Weekday) -> i32 {
    day.num_days_from_monday() as i32
}

fn model_to_domain(m: time_slot::Model) -> TimeSlot {
    TimeSlot {
        id: m.id,
        therapist_id: m.therapist_id,
        date: m.date,
        start_time: m.start_time,
        end_time: m.end_time,
        is_available: m.is_available,
        is_holiday: m.is_holiday,
        is_buffer_blocked: m.is_buffer_blocked,
        max_capacity: m.max_capacity,
        current_bookings: m.current_bookings,
        created_at: m.created_at,
    }
}

fn domain_to_active(s: TimeSlot) -> time_slot::ActiveModel {
    time_slot::ActiveModel {
        id: Set(s.id),
        therapist_id: Set(s.therapist_id),
        day_of_week: Set(weekday_index(s.date.weekday())),
        date: Set(s.date),
        start_time: Set(s.start_time),
        end_time: Set(s.end_time),
        is_available: Set(s.is_available),
        is_holiday: Set(s.is_holiday),
        is_buffer_blocked: Set(s.is_buffer_blocked),
        max_capacity: Set(s.max_capacity),
        current_bookings: Set(s.current_bookings),
        created_at: Set(s.created_at),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// Available, not a holiday, not buffer-blocked, under capacity
fn bookable() -> Condition {
    Condition::all()
        .add(time_slot::Column::IsAvailable.eq(true))
        .add(time_slot::Column::IsHoliday.eq(false))
        .add(time_slot::Column::IsBufferBlocked.eq(false))
        .add(
            Expr::col(time_slot::Column::CurrentBookings)
                .lt(Expr::col(time_slot::Column::MaxCapacity)),
        )
}

// ── SlotRepository impl ─────────────────────────────────────────

#[async_trait]
impl SlotRepository for SeaOrmSlotRepository {
    async fn insert_many(&self, slots: Vec<TimeSlot>) -> DomainResult<u64> {
        if slots.is_empty() {
            return Ok(0);
        }
        debug!("Inserting {} time slots", slots.len());

        let mut created = 0;
        let mut models: Vec<time_slot::ActiveModel> =
            slots.into_iter().map(domain_to_active).collect();
        while !models.is_empty() {
            let rest = models.split_off(models.len().min(INSERT_CHUNK));
            let chunk = std::mem::replace(&mut models, rest);
            created += time_slot::Entity::insert_many(chunk)
                .on_conflict(
                    OnConflict::columns([
                        time_slot::Column::TherapistId,
                        time_slot::Column::Date,
                        time_slot::Column::StartTime,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await
                .map_err(db_err)?;
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<TimeSlot>> {
        let model = time_slot::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn existing_starts(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<HashSet<(NaiveDate, NaiveTime)>> {
        let rows: Vec<(NaiveDate, NaiveTime)> = time_slot::Entity::find()
            .select_only()
            .column(time_slot::Column::Date)
            .column(time_slot::Column::StartTime)
            .filter(time_slot::Column::TherapistId.eq(therapist_id))
            .filter(time_slot::Column::Date.between(from, to))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().collect())
    }

    async fn search(&self, query: &SlotQuery) -> DomainResult<Vec<TimeSlot>> {
        let mut select = time_slot::Entity::find().filter(bookable());

        if let Some(from) = query.date_from {
            select = select.filter(time_slot::Column::Date.gte(from));
        }
        if let Some(to) = query.date_to {
            select = select.filter(time_slot::Column::Date.lte(to));
        }
        if !query.days_of_week.is_empty() {
            select = select.filter(
                time_slot::Column::DayOfWeek
                    .is_in(query.days_of_week.iter().copied().map(weekday_index)),
            );
        }
        if !query.time_buckets.is_empty() {
            let mut any = Condition::any();
            for bucket in &query.time_buckets {
                let (start, end) = bucket.bounds();
                any = any.add(
                    Condition::all()
                        .add(time_slot::Column::StartTime.gte(start))
                        .add(time_slot::Column::StartTime.lt(end)),
                );
            }
            select = select.filter(any);
        }
        if let Some(ids) = &query.therapist_ids {
            select = select.filter(time_slot::Column::TherapistId.is_in(ids.clone()));
        }

        let models = select
            .order_by_asc(time_slot::Column::Date)
            .order_by_asc(time_slot::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn list_for_therapist(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<TimeSlot>> {
        let models = time_slot::Entity::find()
            .filter(time_slot::Column::TherapistId.eq(therapist_id))
            .filter(time_slot::Column::Date.between(from, to))
            .order_by_asc(time_slot::Column::Date)
            .order_by_asc(time_slot::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn try_reserve(&self, id: &str) -> DomainResult<bool> {
        let result = time_slot::Entity::update_many()
            .col_expr(
                time_slot::Column::CurrentBookings,
                Expr::col(time_slot::Column::CurrentBookings).add(1),
            )
            .filter(time_slot::Column::Id.eq(id))
            .filter(bookable())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        debug!("Reserve slot {}: rows_affected={}", id, result.rows_affected);
        Ok(result.rows_affected == 1)
    }

    async fn release(&self, id: &str) -> DomainResult<bool> {
        let result = time_slot::Entity::update_many()
            .col_expr(
                time_slot::Column::CurrentBookings,
                Expr::col(time_slot::Column::CurrentBookings).sub(1),
            )
            .filter(time_slot::Column::Id.eq(id))
            .filter(time_slot::Column::CurrentBookings.gt(0))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        debug!("Release slot {}: rows_affected={}", id, result.rows_affected);
        Ok(result.rows_affected == 1)
    }

    async fn update_flags(&self, id: &str, flags: &SlotFlags) -> DomainResult<Option<TimeSlot>> {
        let Some(existing) = time_slot::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut model: time_slot::ActiveModel = existing.into();
        if let Some(v) = flags.is_available {
            model.is_available = Set(v);
        }
        if let Some(v) = flags.is_holiday {
            model.is_holiday = Set(v);
        }
        if let Some(v) = flags.is_buffer_blocked {
            model.is_buffer_blocked = Set(v);
        }
        let updated = model.update(&self.db).await.map_err(db_err)?;
        Ok(Some(model_to_domain(updated)))
    }

    async fn add_holiday(&self, h: Holiday) -> DomainResult<()> {
        debug!("Adding holiday {} for {:?}", h.date, h.therapist_id);
        let model = holiday::ActiveModel {
            id: Set(h.id),
            therapist_id: Set(h.therapist_id),
            date: Set(h.date),
            reason: Set(h.reason),
        };
        holiday::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn mark_holiday(&self, therapist_id: Option<&str>, date: NaiveDate) -> DomainResult<u64> {
        let mut update = time_slot::Entity::update_many()
            .col_expr(time_slot::Column::IsHoliday, Expr::value(true))
            .filter(time_slot::Column::Date.eq(date));
        if let Some(therapist_id) = therapist_id {
            update = update.filter(time_slot::Column::TherapistId.eq(therapist_id));
        }
        let result = update.exec(&self.db).await.map_err(db_err)?;
        Ok(result.rows_affected)
    }

    async fn holiday_dates(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<HashSet<NaiveDate>> {
        let dates: Vec<NaiveDate> = holiday::Entity::find()
            .select_only()
            .column(holiday::Column::Date)
            .filter(holiday::Column::Date.between(from, to))
            .filter(
                Condition::any()
                    .add(holiday::Column::TherapistId.eq(therapist_id))
                    .add(holiday::Column::TherapistId.is_null()),
            )
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(dates.into_iter().collect())
    }
}
