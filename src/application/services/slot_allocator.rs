//! Slot capacity control and pattern-based slot generation

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::application::principal::Principal;
use crate::domain::{
    DomainError, DomainResult, GenerationReport, GenerationRequest, Holiday, ProfileDirectory,
    RepositoryProvider, SlotFlags, TimeSlot,
};

/// Owns every change to `TimeSlot` rows
pub struct SlotAllocator {
    repos: Arc<dyn RepositoryProvider>,
    profiles: Arc<dyn ProfileDirectory>,
    max_generation_months: u32,
}

impl SlotAllocator {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        profiles: Arc<dyn ProfileDirectory>,
        max_generation_months: u32,
    ) -> Self {
        Self {
            repos,
            profiles,
            max_generation_months,
        }
    }

    // ── Capacity ────────────────────────────────────────────────

    /// Take one unit of capacity.
    ///
    /// Fails with `Conflict` when the slot is full or flagged unbookable and
    /// with `NotFound` when it does not exist.
    pub async fn reserve(&self, slot_id: &str) -> DomainResult<()> {
        if self.repos.slots().try_reserve(slot_id).await? {
            metrics::counter!("booking_slot_reservations_total", "outcome" => "reserved").increment(1);
            debug!(slot_id, "Slot reserved");
            return Ok(());
        }

        metrics::counter!("booking_slot_reservations_total", "outcome" => "conflict").increment(1);
        match self.repos.slots().find_by_id(slot_id).await? {
            Some(_) => Err(DomainError::Conflict(format!(
                "slot {} is not bookable",
                slot_id
            ))),
            None => Err(DomainError::not_found("TimeSlot", slot_id)),
        }
    }

    /// Give back one unit of capacity. Releasing an empty slot is a no-op.
    pub async fn release(&self, slot_id: &str) -> DomainResult<()> {
        if self.repos.slots().release(slot_id).await? {
            debug!(slot_id, "Slot released");
            return Ok(());
        }
        match self.repos.slots().find_by_id(slot_id).await? {
            Some(_) => {
                warn!(slot_id, "Release on a slot with no bookings ignored");
                Ok(())
            }
            None => Err(DomainError::not_found("TimeSlot", slot_id)),
        }
    }

    /// Release every slot, logging failures instead of returning them.
    /// Used on compensation paths where the primary error must win.
    pub(crate) async fn release_all(&self, slot_ids: &[String]) {
        let results = join_all(slot_ids.iter().map(|id| self.release(id))).await;
        for (slot_id, result) in slot_ids.iter().zip(results) {
            if let Err(e) = result {
                warn!(slot_id = %slot_id, error = %e, "Failed to release slot");
            }
        }
    }

    // ── Generation ──────────────────────────────────────────────

    /// Expand a weekly pattern into slots over `[start_date, end_date]`.
    ///
    /// Existing `(date, start_time)` pairs are skipped, so re-running the same
    /// request creates nothing.
    pub async fn generate_pattern(
        &self,
        principal: &Principal,
        req: GenerationRequest,
    ) -> DomainResult<GenerationReport> {
        principal.ensure_therapist(&req.therapist_id)?;
        self.validate(&req)?;
        if !self.profiles.therapist_exists(&req.therapist_id).await? {
            return Err(DomainError::not_found("Therapist", req.therapist_id.clone()));
        }

        let holidays = if req.exclude_holidays {
            self.repos
                .slots()
                .holiday_dates(&req.therapist_id, req.start_date, req.end_date)
                .await?
        } else {
            Default::default()
        };
        let existing = self
            .repos
            .slots()
            .existing_starts(&req.therapist_id, req.start_date, req.end_date)
            .await?;

        let mut report = GenerationReport::default();
        let mut fresh = Vec::new();
        for date in req.start_date.iter_days().take_while(|d| *d <= req.end_date) {
            let ranges = req.weekly_pattern.ranges_for(date.weekday());
            if ranges.is_empty() {
                continue;
            }
            if holidays.contains(&date) {
                report.skipped_holidays += 1;
                continue;
            }
            for range in ranges {
                for (start, end) in range.split(req.session_duration_minutes) {
                    if existing.contains(&(date, start)) {
                        report.skipped_existing += 1;
                    } else {
                        fresh.push(TimeSlot::new(
                            req.therapist_id.clone(),
                            date,
                            start,
                            end,
                            req.max_capacity,
                        ));
                    }
                }
            }
        }

        let candidates = fresh.len() as u64;
        report.created = self.repos.slots().insert_many(fresh).await?;
        // Rows inserted concurrently by another run are skipped by the store.
        report.skipped_existing += candidates - report.created;

        info!(
            therapist_id = %req.therapist_id,
            from = %req.start_date,
            to = %req.end_date,
            created = report.created,
            skipped_existing = report.skipped_existing,
            skipped_holidays = report.skipped_holidays,
            "Slots generated"
        );
        Ok(report)
    }

    fn validate(&self, req: &GenerationRequest) -> DomainResult<()> {
        if req.session_duration_minutes == 0 {
            return Err(DomainError::Validation(
                "session_duration_minutes must be positive".into(),
            ));
        }
        if req.max_capacity < 1 {
            return Err(DomainError::Validation("max_capacity must be at least 1".into()));
        }
        if req.end_date < req.start_date {
            return Err(DomainError::Validation("end_date precedes start_date".into()));
        }
        let limit = req
            .start_date
            .checked_add_months(Months::new(self.max_generation_months))
            .ok_or_else(|| DomainError::Validation("start_date out of range".into()))?;
        if req.end_date > limit {
            return Err(DomainError::Validation(format!(
                "generation range may not exceed {} months",
                self.max_generation_months
            )));
        }
        if req.weekly_pattern.is_empty() {
            return Err(DomainError::Validation("weekly_pattern has no working hours".into()));
        }
        if let Some(bad) = req.weekly_pattern.ranges().find(|r| r.start >= r.end) {
            return Err(DomainError::Validation(format!(
                "time range {}-{} is empty",
                bad.start, bad.end
            )));
        }
        Ok(())
    }

    // ── Administration ──────────────────────────────────────────

    /// Record a holiday and flag any slots already generated on that date.
    /// Global holidays (no therapist) are admin-only.
    pub async fn add_holiday(
        &self,
        principal: &Principal,
        therapist_id: Option<String>,
        date: NaiveDate,
        reason: Option<String>,
    ) -> DomainResult<Holiday> {
        match &therapist_id {
            Some(id) => principal.ensure_therapist(id)?,
            None => principal.ensure_admin()?,
        }

        let holiday = Holiday::new(therapist_id, date, reason);
        self.repos.slots().add_holiday(holiday.clone()).await?;
        let flagged = self
            .repos
            .slots()
            .mark_holiday(holiday.therapist_id.as_deref(), date)
            .await?;

        info!(
            therapist_id = ?holiday.therapist_id,
            %date,
            flagged,
            "Holiday added"
        );
        Ok(holiday)
    }

    pub async fn update_flags(
        &self,
        principal: &Principal,
        slot_id: &str,
        flags: SlotFlags,
    ) -> DomainResult<TimeSlot> {
        let slot = self
            .repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("TimeSlot", slot_id))?;
        principal.ensure_therapist(&slot.therapist_id)?;

        let updated = self
            .repos
            .slots()
            .update_flags(slot_id, &flags)
            .await?
            .ok_or_else(|| DomainError::not_found("TimeSlot", slot_id))?;
        info!(slot_id, bookable = updated.is_bookable(), "Slot flags updated");
        Ok(updated)
    }

    pub async fn list_slots(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<TimeSlot>> {
        if to < from {
            return Err(DomainError::Validation("`to` precedes `from`".into()));
        }
        self.repos.slots().list_for_therapist(therapist_id, from, to).await
    }

    pub async fn get(&self, slot_id: &str) -> DomainResult<TimeSlot> {
        self.repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("TimeSlot", slot_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures::{date, time, Fixture};
    use crate::domain::{TimeRange, WeeklyPattern};
    use chrono::Weekday;

    fn request(start: NaiveDate, end: NaiveDate) -> GenerationRequest {
        GenerationRequest {
            therapist_id: "th-1".into(),
            start_date: start,
            end_date: end,
            weekly_pattern: WeeklyPattern::new()
                .with(Weekday::Mon, TimeRange::new(time(9, 0), time(12, 0)))
                .with(Weekday::Wed, TimeRange::new(time(14, 0), time(16, 0))),
            session_duration_minutes: 60,
            max_capacity: 1,
            exclude_holidays: true,
        }
    }

    #[tokio::test]
    async fn generation_is_idempotent() {
        let fx = Fixture::new();
        let admin = Principal::admin("admin");
        // 2026-03-02 is a Monday; two full weeks
        let req = request(date(2026, 3, 2), date(2026, 3, 15));

        let first = fx.slots.generate_pattern(&admin, req.clone()).await.unwrap();
        assert_eq!(first.created, 2 * (3 + 2));
        assert_eq!(first.skipped_existing, 0);

        let second = fx.slots.generate_pattern(&admin, req).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped_existing, first.created);
    }

    #[tokio::test]
    async fn generation_skips_therapist_and_global_holidays() {
        let fx = Fixture::new();
        let admin = Principal::admin("admin");
        fx.slots
            .add_holiday(&admin, None, date(2026, 3, 2), Some("national".into()))
            .await
            .unwrap();
        fx.slots
            .add_holiday(&Principal::therapist("th-1"), Some("th-1".into()), date(2026, 3, 4), None)
            .await
            .unwrap();
        fx.slots
            .add_holiday(&admin, Some("th-2".into()), date(2026, 3, 9), None)
            .await
            .unwrap();

        let report = fx
            .slots
            .generate_pattern(&admin, request(date(2026, 3, 2), date(2026, 3, 15)))
            .await
            .unwrap();
        assert_eq!(report.skipped_holidays, 2);
        assert_eq!(report.created, 3 + 2);
    }

    #[tokio::test]
    async fn generation_range_is_capped() {
        let fx = Fixture::new();
        let admin = Principal::admin("admin");
        let err = fx
            .slots
            .generate_pattern(&admin, request(date(2026, 3, 2), date(2026, 6, 3)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert!(fx
            .slots
            .generate_pattern(&admin, request(date(2026, 3, 2), date(2026, 6, 2)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn generation_for_another_therapist_is_forbidden() {
        let fx = Fixture::new();
        let err = fx
            .slots
            .generate_pattern(
                &Principal::therapist("th-2"),
                request(date(2026, 3, 2), date(2026, 3, 8)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn concurrent_reservations_on_single_capacity_slot() {
        let fx = Fixture::new();
        let slot = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;

        let tasks = (0..16).map(|_| {
            let alloc = fx.slots.clone();
            let id = slot.id.clone();
            tokio::spawn(async move { alloc.reserve(&id).await })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::Conflict(_))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(fx.slots.get(&slot.id).await.unwrap().current_bookings, 1);
    }

    #[tokio::test]
    async fn flags_and_holidays_block_reservation() {
        let fx = Fixture::new();
        let slot = fx.slot("th-1", date(2026, 3, 2), 10, 2).await;
        let admin = Principal::admin("admin");

        fx.slots
            .update_flags(
                &admin,
                &slot.id,
                SlotFlags {
                    is_buffer_blocked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(fx.slots.reserve(&slot.id).await, Err(DomainError::Conflict(_))));

        fx.slots
            .update_flags(
                &admin,
                &slot.id,
                SlotFlags {
                    is_buffer_blocked: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        fx.slots.reserve(&slot.id).await.unwrap();

        fx.slots
            .add_holiday(&admin, None, date(2026, 3, 2), None)
            .await
            .unwrap();
        assert!(matches!(fx.slots.reserve(&slot.id).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn release_never_goes_negative() {
        let fx = Fixture::new();
        let slot = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        fx.slots.release(&slot.id).await.unwrap();
        assert_eq!(fx.slots.get(&slot.id).await.unwrap().current_bookings, 0);
        assert!(matches!(
            fx.slots.reserve("missing").await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
