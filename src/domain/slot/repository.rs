//! Time slot repository interface

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use super::model::{Holiday, SlotFlags, SlotQuery, TimeSlot};
use crate::domain::DomainResult;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Insert slots, silently skipping any `(therapist, date, start_time)`
    /// that already exists. Returns the number of rows created.
    async fn insert_many(&self, slots: Vec<TimeSlot>) -> DomainResult<u64>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<TimeSlot>>;

    /// `(date, start_time)` pairs already present for a therapist in a range
    async fn existing_starts(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<HashSet<(NaiveDate, NaiveTime)>>;

    /// Bookable slots matching every supplied dimension, ordered by date and time
    async fn search(&self, query: &SlotQuery) -> DomainResult<Vec<TimeSlot>>;

    async fn list_for_therapist(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<TimeSlot>>;

    /// Atomically increment `current_bookings` iff the slot is bookable.
    /// Returns `false` when the slot is missing, flagged or full.
    async fn try_reserve(&self, id: &str) -> DomainResult<bool>;

    /// Decrement `current_bookings`, never below zero.
    /// Returns `false` when nothing was decremented.
    async fn release(&self, id: &str) -> DomainResult<bool>;

    async fn update_flags(&self, id: &str, flags: &SlotFlags) -> DomainResult<Option<TimeSlot>>;

    async fn add_holiday(&self, holiday: Holiday) -> DomainResult<()>;

    /// Flag existing slots on `date` as holiday: one therapist's, or everyone's
    /// when `therapist_id` is `None`. Returns the number of slots flagged.
    async fn mark_holiday(&self, therapist_id: Option<&str>, date: NaiveDate) -> DomainResult<u64>;

    /// Holiday dates that apply to a therapist: their own plus global ones
    async fn holiday_dates(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<HashSet<NaiveDate>>;
}
