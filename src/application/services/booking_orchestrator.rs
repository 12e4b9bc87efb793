//! Booking group creation and every pre-completion exit
//!
//! Slot counters and entity rows live in different stores: counters move
//! through the atomic `SlotAllocator` calls, entity rows through one
//! `WriteBatch` per operation. Reservations are taken before the batch is
//! committed and handed back if it fails; releases happen after a successful
//! commit.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::payment_ledger::load_payment;
use super::slot_allocator::SlotAllocator;
use crate::application::principal::{Principal, Role};
use crate::domain::status::{display_status, ensure_booking_transition};
use crate::domain::{
    Booking, BookingFilter, BookingStatus, DisplayStatus, DomainError, DomainResult, Initiator,
    LedgerEntry, LedgerEntryKind, Money, Payment, PaymentStatus, RefundCalculator, RefundOutcome,
    RefundTier, RepositoryProvider, TimeSlot, WriteBatch,
};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

/// Booking with the status shown to the paying party
#[derive(Debug, Clone)]
pub struct BookingView {
    pub booking: Booking,
    pub payment_status: PaymentStatus,
    pub display_status: DisplayStatus,
}

/// Result of a cancellation, rejection or no-show
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub payment: Payment,
    pub refund: RefundOutcome,
    /// Compensation / penalty rows written with the cancellation
    pub ledger_entries: Vec<LedgerEntry>,
}

/// Time-tier refund of one short-notice session inside a package cancellation
#[derive(Debug, Clone, Serialize)]
pub struct SessionRefund {
    pub booking_id: String,
    pub refund: RefundOutcome,
}

/// Result of cancelling the unused part of a package
#[derive(Debug, Clone, Serialize)]
pub struct PackageCancellation {
    pub payment_id: String,
    /// Completed, missed and short-notice sessions
    pub used_sessions: i64,
    /// Mid-term refund over the sessions outside the notice window
    pub refund: RefundOutcome,
    pub session_refunds: Vec<SessionRefund>,
    /// Package refund plus every session refund
    pub total_refund: Money,
    pub cancelled_booking_ids: Vec<String>,
}

pub struct BookingOrchestrator {
    repos: Arc<dyn RepositoryProvider>,
    slots: Arc<SlotAllocator>,
    refunds: RefundCalculator,
}

impl BookingOrchestrator {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        slots: Arc<SlotAllocator>,
        refunds: RefundCalculator,
    ) -> Self {
        Self {
            repos,
            slots,
            refunds,
        }
    }

    // ── Creation ────────────────────────────────────────────────

    /// Reserve one slot per purchased session and create the booking group.
    ///
    /// All reservations succeed or none are kept: on the first failure every
    /// slot already reserved by this call is released and `SlotConflict` is
    /// returned. Sessions are numbered 1..N in chronological order.
    pub async fn create_booking_group(
        &self,
        principal: &Principal,
        payment_id: &str,
        slot_ids: &[String],
    ) -> DomainResult<Vec<Booking>> {
        let payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_parent(&payment.parent_id)?;

        if !matches!(payment.status, PaymentStatus::PendingPayment | PaymentStatus::Paid) {
            return Err(DomainError::Validation(format!(
                "payment {} is {}; only pending or paid payments can be booked",
                payment_id, payment.status
            )));
        }
        if !self.repos.bookings().find_by_payment(payment_id).await?.is_empty() {
            return Err(DomainError::Validation(format!(
                "payment {} already has bookings",
                payment_id
            )));
        }
        if slot_ids.len() != payment.total_sessions as usize {
            return Err(DomainError::Validation(format!(
                "expected {} slots, got {}",
                payment.total_sessions,
                slot_ids.len()
            )));
        }
        let unique: HashSet<&String> = slot_ids.iter().collect();
        if unique.len() != slot_ids.len() {
            return Err(DomainError::Validation("slot ids must be distinct".into()));
        }

        let slots = self.load_slots(&payment, slot_ids).await?;
        let held = self.reserve_in_order(&slots).await?;

        let bookings: Vec<Booking> = slots
            .iter()
            .zip(payment.fee_shares())
            .enumerate()
            .map(|(i, (slot, fee))| Booking::for_slot(&payment, slot, i as i32 + 1, fee))
            .collect();

        let mut batch = WriteBatch::new();
        for booking in &bookings {
            batch.insert_booking(booking.clone());
        }
        if let Err(e) = self.repos.commit(batch).await {
            error!(payment_id, error = %e, "Booking group commit failed; releasing slots");
            self.slots.release_all(&held).await;
            return Err(e);
        }

        metrics::counter!("booking_groups_created_total").increment(1);
        info!(
            payment_id,
            group_key = %payment.group_key(),
            sessions = bookings.len(),
            "Booking group created"
        );
        Ok(bookings)
    }

    /// Chronologically ordered slots, all belonging to the payment's therapist.
    async fn load_slots(&self, payment: &Payment, slot_ids: &[String]) -> DomainResult<Vec<TimeSlot>> {
        let mut slots = Vec::with_capacity(slot_ids.len());
        for id in slot_ids {
            let slot = self
                .repos
                .slots()
                .find_by_id(id)
                .await?
                .ok_or_else(|| DomainError::not_found("TimeSlot", id.clone()))?;
            if slot.therapist_id != payment.therapist_id {
                return Err(DomainError::Validation(format!(
                    "slot {} belongs to another therapist",
                    id
                )));
            }
            slots.push(slot);
        }
        slots.sort_by_key(|s| (s.starts_at(), s.id.clone()));
        Ok(slots)
    }

    async fn reserve_in_order(&self, slots: &[TimeSlot]) -> DomainResult<Vec<String>> {
        let mut held: Vec<String> = Vec::with_capacity(slots.len());
        for slot in slots {
            match self.slots.reserve(&slot.id).await {
                Ok(()) => held.push(slot.id.clone()),
                Err(e) => {
                    warn!(
                        slot_id = %slot.id,
                        reserved = held.len(),
                        error = %e,
                        "Group reservation failed; rolling back"
                    );
                    self.slots.release_all(&held).await;
                    return Err(match e {
                        DomainError::Storage(_) => e,
                        _ => DomainError::SlotConflict {
                            slot_id: slot.id.clone(),
                            reserved_before_failure: held.len(),
                        },
                    });
                }
            }
        }
        Ok(held)
    }

    // ── Forward transitions ─────────────────────────────────────

    /// Therapist accepts a pending booking. Requires a collected payment.
    pub async fn confirm(&self, principal: &Principal, booking_id: &str) -> DomainResult<Booking> {
        let (mut booking, payment) = self.load(booking_id).await?;
        principal.ensure_therapist(&booking.therapist_id)?;
        ensure_booking_transition(booking.status, BookingStatus::Confirmed, payment.status)?;

        booking.status = BookingStatus::Confirmed;
        booking.updated_at = Utc::now();
        let mut batch = WriteBatch::new();
        batch.update_booking(booking.clone());
        self.repos.commit(batch).await?;

        info!(booking_id, "Booking confirmed");
        Ok(booking)
    }

    // ── Exits ───────────────────────────────────────────────────

    /// Cancel or reject a booking on behalf of the caller's role.
    ///
    /// A therapist declining a pending booking rejects it; every other case
    /// cancels. The refund is computed by [`RefundCalculator`], capped by what
    /// the payment can still return, and the slot is released.
    pub async fn cancel(
        &self,
        principal: &Principal,
        booking_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<CancellationOutcome> {
        let (mut booking, mut payment) = self.load(booking_id).await?;
        principal.ensure_party_to(&booking)?;
        let initiator = principal.initiator();

        let target = match (initiator, booking.status) {
            (Initiator::Therapist, BookingStatus::PendingConfirmation) => BookingStatus::Rejected,
            _ => BookingStatus::Cancelled,
        };
        ensure_booking_transition(booking.status, target, payment.status)?;

        let fee = booking.fee_share;
        let outcome = if payment.is_unpaid() {
            self.refunds.unpaid(fee)
        } else {
            match (initiator, booking.status) {
                (Initiator::Parent, BookingStatus::Confirmed) => {
                    self.refunds.parent_cancellation(fee, booking.scheduled_at, at)
                }
                (Initiator::Parent, _) => self.refunds.full(fee, RefundTier::ParentUnconfirmed),
                (Initiator::Therapist, BookingStatus::Confirmed) => {
                    self.refunds.therapist_cancellation(fee, booking.scheduled_at, at)
                }
                (Initiator::Therapist, _) => self.refunds.full(fee, RefundTier::TherapistRejected),
                (Initiator::Admin, _) => self.refunds.full(fee, RefundTier::AdminCancel),
            }
        };
        let outcome = outcome.capped_at(payment.refundable());

        booking.status = target;
        booking.cancelled_by = Some(initiator);
        booking.cancelled_at = Some(at);

        let result = self
            .close_booking(&mut booking, &mut payment, outcome)
            .await?;
        self.slots.release_all(std::slice::from_ref(&booking.slot_id)).await;

        metrics::counter!(
            "booking_cancellations_total",
            "initiator" => initiator.as_str(),
            "tier" => outcome.tier.as_str()
        )
        .increment(1);
        info!(
            booking_id,
            initiator = %initiator,
            status = %booking.status,
            tier = %outcome.tier,
            refund = outcome.refund_amount,
            "Booking cancelled"
        );
        Ok(result)
    }

    /// Mark a confirmed session as missed by `absent`.
    ///
    /// A missing parent forfeits the fee. A missing therapist triggers a full
    /// refund plus the flat compensation and penalty. The slot stays consumed.
    pub async fn record_no_show(
        &self,
        principal: &Principal,
        booking_id: &str,
        absent: Initiator,
        at: DateTime<Utc>,
    ) -> DomainResult<CancellationOutcome> {
        let (mut booking, mut payment) = self.load(booking_id).await?;
        principal.ensure_party_to(&booking)?;
        let reporter_ok = match (principal.role, absent) {
            (_, Initiator::Admin) => false,
            (Role::Admin, _) => true,
            (Role::Therapist, Initiator::Parent) | (Role::Parent, Initiator::Therapist) => true,
            _ => false,
        };
        if !reporter_ok {
            return Err(DomainError::Forbidden(format!(
                "{} cannot report a {} no-show",
                principal.role.as_str(),
                absent
            )));
        }
        if at < booking.scheduled_at {
            return Err(DomainError::Validation(
                "a no-show can only be recorded after the session start".into(),
            ));
        }
        ensure_booking_transition(booking.status, BookingStatus::NoShow, payment.status)?;

        let outcome = self
            .refunds
            .no_show(booking.fee_share, absent)
            .capped_at(payment.refundable());
        booking.status = BookingStatus::NoShow;
        booking.cancelled_by = Some(absent);
        booking.cancelled_at = Some(at);

        let result = self
            .close_booking(&mut booking, &mut payment, outcome)
            .await?;

        metrics::counter!(
            "booking_cancellations_total",
            "initiator" => absent.as_str(),
            "tier" => outcome.tier.as_str()
        )
        .increment(1);
        info!(
            booking_id,
            absent = %absent,
            refund = outcome.refund_amount,
            "No-show recorded"
        );
        Ok(result)
    }

    /// Shared tail of cancel / no-show: refund, ledger rows, one commit.
    async fn close_booking(
        &self,
        booking: &mut Booking,
        payment: &mut Payment,
        outcome: RefundOutcome,
    ) -> DomainResult<CancellationOutcome> {
        booking.refund_amount = outcome.refund_amount;
        booking.updated_at = Utc::now();

        let mut batch = WriteBatch::new();
        batch.update_booking(booking.clone());
        if outcome.refund_amount > 0 {
            payment.apply_refund(outcome.refund_amount)?;
            batch.update_payment(payment.clone());
        }

        let mut entries = Vec::new();
        if outcome.parent_compensation > 0 {
            entries.push(self.ledger_entry(
                LedgerEntryKind::ParentCompensation,
                booking,
                outcome.parent_compensation,
            ));
        }
        if outcome.therapist_penalty > 0 {
            entries.push(self.ledger_entry(
                LedgerEntryKind::TherapistPenalty,
                booking,
                outcome.therapist_penalty,
            ));
        }
        for entry in &entries {
            batch.insert_ledger_entry(entry.clone());
        }
        self.repos.commit(batch).await?;

        Ok(CancellationOutcome {
            booking: booking.clone(),
            payment: payment.clone(),
            refund: outcome,
            ledger_entries: entries,
        })
    }

    fn ledger_entry(&self, kind: LedgerEntryKind, booking: &Booking, amount: Money) -> LedgerEntry {
        LedgerEntry::new(
            kind,
            booking.therapist_id.clone(),
            booking.parent_id.clone(),
            Some(booking.payment_id.clone()),
            Some(booking.id.clone()),
            amount,
        )
    }

    /// Cancel every unused session of a multi-session package.
    ///
    /// Sessions count as used once completed or missed. A confirmed session
    /// already inside the 48h notice window keeps its own time tier and counts
    /// as used for the package base. The package refund is spread over the
    /// other cancelled bookings, earliest first receiving any remainder.
    pub async fn cancel_package(
        &self,
        principal: &Principal,
        payment_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<PackageCancellation> {
        let mut payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_parent(&payment.parent_id)?;
        if payment.total_sessions < 2 {
            return Err(DomainError::Validation(format!(
                "payment {} covers a single session; cancel its booking instead",
                payment_id
            )));
        }

        let bookings = self.repos.bookings().find_by_payment(payment_id).await?;
        let consumed = payment.completed_sessions as i64
            + bookings
                .iter()
                .filter(|b| b.status == BookingStatus::NoShow)
                .count() as i64;
        let open: Vec<Booking> = bookings.into_iter().filter(Booking::holds_slot).collect();
        if open.is_empty() {
            return Err(DomainError::Validation(format!(
                "payment {} has no unused sessions",
                payment_id
            )));
        }
        for b in &open {
            ensure_booking_transition(b.status, BookingStatus::Cancelled, payment.status)?;
        }

        let (mut short_notice, mut unused): (Vec<Booking>, Vec<Booking>) =
            open.into_iter().partition(|b| {
                b.status == BookingStatus::Confirmed
                    && self.refunds.inside_notice_window(b.scheduled_at, at)
            });
        let used = consumed + short_notice.len() as i64;

        let mut refundable = payment.refundable();
        let mut session_refunds = Vec::with_capacity(short_notice.len());
        for booking in short_notice.iter_mut() {
            let outcome = if payment.is_unpaid() {
                self.refunds.unpaid(booking.fee_share)
            } else {
                self.refunds
                    .parent_cancellation(booking.fee_share, booking.scheduled_at, at)
                    .capped_at(refundable)
            };
            refundable -= outcome.refund_amount;
            booking.refund_amount = outcome.refund_amount;
            session_refunds.push(SessionRefund {
                booking_id: booking.id.clone(),
                refund: outcome,
            });
        }

        let outcome = if payment.is_unpaid() {
            self.refunds.unpaid(0)
        } else {
            let purchased_at = payment.paid_at.unwrap_or(payment.created_at);
            self.refunds
                .package_refund(payment.final_fee, payment.unit_price(), used, purchased_at, at)
                .capped_at(if unused.is_empty() { 0 } else { refundable })
        };
        let shares = split_evenly(outcome.refund_amount, unused.len());
        for (booking, share) in unused.iter_mut().zip(shares) {
            booking.refund_amount = share;
        }

        let initiator = principal.initiator();
        let now = Utc::now();
        let mut cancelled: Vec<Booking> = short_notice.into_iter().chain(unused).collect();
        cancelled.sort_by_key(|b| b.session_number);
        let mut batch = WriteBatch::new();
        for booking in cancelled.iter_mut() {
            booking.status = BookingStatus::Cancelled;
            booking.cancelled_by = Some(initiator);
            booking.cancelled_at = Some(at);
            booking.updated_at = now;
            batch.update_booking(booking.clone());
        }
        let total_refund: Money = cancelled.iter().map(|b| b.refund_amount).sum();
        if total_refund > 0 {
            payment.apply_refund(total_refund)?;
            batch.update_payment(payment.clone());
        }
        self.repos.commit(batch).await?;

        let slot_ids: Vec<String> = cancelled.iter().map(|b| b.slot_id.clone()).collect();
        self.slots.release_all(&slot_ids).await;

        let tiers = session_refunds
            .iter()
            .map(|r| r.refund.tier)
            .chain(std::iter::once(outcome.tier));
        for tier in tiers {
            metrics::counter!(
                "booking_cancellations_total",
                "initiator" => initiator.as_str(),
                "tier" => tier.as_str()
            )
            .increment(1);
        }
        info!(
            payment_id,
            used_sessions = used,
            cancelled = cancelled.len(),
            short_notice = session_refunds.len(),
            tier = %outcome.tier,
            refund = total_refund,
            "Package cancelled"
        );
        Ok(PackageCancellation {
            payment_id: payment_id.to_string(),
            used_sessions: used,
            refund: outcome,
            session_refunds,
            total_refund,
            cancelled_booking_ids: cancelled.into_iter().map(|b| b.id).collect(),
        })
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get(&self, principal: &Principal, booking_id: &str) -> DomainResult<BookingView> {
        let (booking, payment) = self.load(booking_id).await?;
        principal.ensure_party_to(&booking)?;
        Ok(view(booking, payment.status))
    }

    pub async fn display_status(
        &self,
        principal: &Principal,
        booking_id: &str,
    ) -> DomainResult<DisplayStatus> {
        Ok(self.get(principal, booking_id).await?.display_status)
    }

    pub async fn list_for_parent(
        &self,
        principal: &Principal,
        parent_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<BookingView>> {
        principal.ensure_parent(parent_id)?;
        let bookings = self
            .repos
            .bookings()
            .find_for_parent(parent_id, filter, page)
            .await?;
        self.with_display_status(bookings).await
    }

    pub async fn list_for_therapist(
        &self,
        principal: &Principal,
        therapist_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<BookingView>> {
        principal.ensure_therapist(therapist_id)?;
        let bookings = self
            .repos
            .bookings()
            .find_for_therapist(therapist_id, filter, page)
            .await?;
        self.with_display_status(bookings).await
    }

    /// Booking count per status, every status present (zero when unused).
    pub async fn therapist_status_counts(
        &self,
        principal: &Principal,
        therapist_id: &str,
    ) -> DomainResult<BTreeMap<BookingStatus, u64>> {
        principal.ensure_therapist(therapist_id)?;
        let stored = self
            .repos
            .bookings()
            .status_counts_for_therapist(therapist_id)
            .await?;
        Ok(BookingStatus::ALL
            .into_iter()
            .map(|s| (s, stored.get(&s).copied().unwrap_or(0)))
            .collect())
    }

    async fn with_display_status(
        &self,
        bookings: PaginatedResult<Booking>,
    ) -> DomainResult<PaginatedResult<BookingView>> {
        let mut statuses: HashMap<String, PaymentStatus> = HashMap::new();
        for b in &bookings.items {
            if !statuses.contains_key(&b.payment_id) {
                let payment = load_payment(self.repos.as_ref(), &b.payment_id).await?;
                statuses.insert(b.payment_id.clone(), payment.status);
            }
        }
        Ok(bookings.map(|b| {
            let status = statuses
                .get(&b.payment_id)
                .copied()
                .unwrap_or(PaymentStatus::PendingPayment);
            view(b, status)
        }))
    }

    async fn load(&self, booking_id: &str) -> DomainResult<(Booking, Payment)> {
        let booking = self
            .repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
        let payment = load_payment(self.repos.as_ref(), &booking.payment_id).await?;
        Ok((booking, payment))
    }
}

fn view(booking: Booking, payment_status: PaymentStatus) -> BookingView {
    BookingView {
        display_status: display_status(booking.status, payment_status),
        payment_status,
        booking,
    }
}

/// `n` shares summing to `total`, remainder to the first.
fn split_evenly(total: Money, n: usize) -> Vec<Money> {
    if n == 0 {
        return Vec::new();
    }
    let n = n as Money;
    let base = total / n;
    let remainder = total % n;
    (0..n).map(|i| base + Money::from(i < remainder)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures::{date, Fixture};
    use chrono::Duration;

    fn start_of(slot: &TimeSlot) -> DateTime<Utc> {
        slot.starts_at()
    }

    #[tokio::test]
    async fn three_session_package_creates_numbered_group() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(3, 300_000, 30).await;
        // Passed out of order; numbering follows the calendar
        let s3 = fx.slot("th-1", date(2026, 3, 16), 10, 1).await;
        let s1 = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let s2 = fx.slot("th-1", date(2026, 3, 9), 10, 1).await;

        let bookings = fx
            .bookings
            .create_booking_group(
                &Principal::parent("parent-1"),
                &payment.id,
                &[s3.id.clone(), s1.id.clone(), s2.id.clone()],
            )
            .await
            .unwrap();

        assert_eq!(bookings.len(), 3);
        assert!(bookings.iter().all(|b| b.group_key == payment.id));
        assert!(bookings.iter().all(|b| b.status == BookingStatus::PendingConfirmation));
        assert_eq!(
            bookings.iter().map(|b| b.session_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(bookings[0].slot_id, s1.id);
        assert_eq!(bookings[2].slot_id, s3.id);
        assert_eq!(bookings.iter().map(|b| b.fee_share).sum::<Money>(), 210_000);
        for s in [&s1, &s2, &s3] {
            assert_eq!(fx.slots.get(&s.id).await.unwrap().current_bookings, 1);
        }
    }

    #[tokio::test]
    async fn failed_reservation_releases_the_whole_group() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(3, 300_000, 30).await;
        let s1 = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let s2 = fx.slot("th-1", date(2026, 3, 9), 10, 1).await;
        let taken = fx.slot("th-1", date(2026, 3, 16), 10, 1).await;
        fx.slots.reserve(&taken.id).await.unwrap();

        let err = fx
            .bookings
            .create_booking_group(
                &Principal::parent("parent-1"),
                &payment.id,
                &[s1.id.clone(), s2.id.clone(), taken.id.clone()],
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::SlotConflict {
                slot_id: taken.id.clone(),
                reserved_before_failure: 2
            }
        );
        assert_eq!(fx.slots.get(&s1.id).await.unwrap().current_bookings, 0);
        assert_eq!(fx.slots.get(&s2.id).await.unwrap().current_bookings, 0);
        assert_eq!(fx.slots.get(&taken.id).await.unwrap().current_bookings, 1);
        assert!(fx.repos.bookings().find_by_payment(&payment.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_input_is_validated() {
        let fx = Fixture::new();
        let parent = Principal::parent("parent-1");
        let payment = fx.paid_payment(2, 200_000, 0).await;
        let s1 = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let foreign = fx.slot("th-2", date(2026, 3, 3), 10, 1).await;

        let one = [s1.id.clone()];
        assert!(matches!(
            fx.bookings.create_booking_group(&parent, &payment.id, &one).await,
            Err(DomainError::Validation(_))
        ));
        let dup = [s1.id.clone(), s1.id.clone()];
        assert!(matches!(
            fx.bookings.create_booking_group(&parent, &payment.id, &dup).await,
            Err(DomainError::Validation(_))
        ));
        let mixed = [s1.id.clone(), foreign.id.clone()];
        assert!(matches!(
            fx.bookings.create_booking_group(&parent, &payment.id, &mixed).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(fx.slots.get(&s1.id).await.unwrap().current_bookings, 0);

        let failed = fx.unpaid_payment(1, 50_000, 0).await;
        fx.payments.mark_failed(&parent, &failed.id).await.unwrap();
        let err = fx
            .bookings
            .create_booking_group(&parent, &failed.id, &[s1.id.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref msg) if msg.contains("FAILED")));
        assert_eq!(fx.slots.get(&s1.id).await.unwrap().current_bookings, 0);
    }

    #[tokio::test]
    async fn unpaid_booking_cannot_be_confirmed_and_shows_payment_pending() {
        let fx = Fixture::new();
        let payment = fx.unpaid_payment(1, 50_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let booking = fx.book(&payment, &[&slot]).await.remove(0);

        let err = fx
            .bookings
            .confirm(&Principal::therapist("th-1"), &booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

        let shown = fx
            .bookings
            .display_status(&Principal::parent("parent-1"), &booking.id)
            .await
            .unwrap();
        assert_eq!(shown, DisplayStatus::PaymentPending);
    }

    #[tokio::test]
    async fn parent_cancellation_applies_time_tier() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 70_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 10), 15, 1).await;
        let booking = fx.book_confirmed(&payment, &[&slot]).await.remove(0);

        let at = start_of(&slot) - Duration::hours(30);
        let out = fx
            .bookings
            .cancel(&Principal::parent("parent-1"), &booking.id, at)
            .await
            .unwrap();

        assert_eq!(out.booking.status, BookingStatus::Cancelled);
        assert_eq!(out.booking.cancelled_by, Some(Initiator::Parent));
        assert_eq!(out.refund.tier, RefundTier::ParentLate);
        assert_eq!(out.refund.refund_amount, 49_000);
        assert_eq!(out.payment.refunded_amount, 49_000);
        assert_eq!(out.payment.status, PaymentStatus::PartiallyRefunded);
        assert!(out.ledger_entries.is_empty());
        assert_eq!(fx.slots.get(&slot.id).await.unwrap().current_bookings, 0);
    }

    #[tokio::test]
    async fn therapist_rejects_pending_booking() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 70_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 10), 15, 1).await;
        let booking = fx.book(&payment, &[&slot]).await.remove(0);

        let out = fx
            .bookings
            .cancel(&Principal::therapist("th-1"), &booking.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(out.booking.status, BookingStatus::Rejected);
        assert_eq!(out.refund.tier, RefundTier::TherapistRejected);
        assert_eq!(out.payment.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn unpaid_cancellation_refunds_nothing() {
        let fx = Fixture::new();
        let payment = fx.unpaid_payment(1, 70_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 10), 15, 1).await;
        let booking = fx.book(&payment, &[&slot]).await.remove(0);

        let out = fx
            .bookings
            .cancel(&Principal::parent("parent-1"), &booking.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(out.refund.tier, RefundTier::Unpaid);
        assert_eq!(out.refund.refund_amount, 0);
        assert_eq!(out.payment.status, PaymentStatus::PendingPayment);
        assert_eq!(fx.slots.get(&slot.id).await.unwrap().current_bookings, 0);
    }

    #[tokio::test]
    async fn cancelling_twice_is_an_invalid_transition() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 70_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 10), 15, 1).await;
        let booking = fx.book(&payment, &[&slot]).await.remove(0);
        let parent = Principal::parent("parent-1");

        fx.bookings.cancel(&parent, &booking.id, Utc::now()).await.unwrap();
        assert!(matches!(
            fx.bookings.cancel(&parent, &booking.id, Utc::now()).await,
            Err(DomainError::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            fx.bookings.cancel(&Principal::parent("parent-2"), &booking.id, Utc::now()).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn therapist_no_show_compensates_parent_and_keeps_slot() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 70_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 10), 15, 1).await;
        let booking = fx.book_confirmed(&payment, &[&slot]).await.remove(0);
        let parent = Principal::parent("parent-1");

        assert!(matches!(
            fx.bookings
                .record_no_show(&parent, &booking.id, Initiator::Therapist, start_of(&slot) - Duration::minutes(1))
                .await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            fx.bookings
                .record_no_show(&parent, &booking.id, Initiator::Parent, start_of(&slot))
                .await,
            Err(DomainError::Forbidden(_))
        ));

        let out = fx
            .bookings
            .record_no_show(&parent, &booking.id, Initiator::Therapist, start_of(&slot) + Duration::minutes(20))
            .await
            .unwrap();
        assert_eq!(out.booking.status, BookingStatus::NoShow);
        assert_eq!(out.refund.refund_amount, 70_000);
        assert_eq!(out.ledger_entries.len(), 2);
        assert_eq!(fx.slots.get(&slot.id).await.unwrap().current_bookings, 1);

        let credits = fx.payments.parent_credits(&parent, "parent-1").await.unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].amount, 10_000);
    }

    #[tokio::test]
    async fn package_cancellation_refunds_unused_sessions() {
        let fx = Fixture::new();
        // 5 x 100,000, no discount
        let payment = fx.paid_payment(5, 500_000, 0).await;
        let paid_at = payment.paid_at.unwrap();
        let first_day = (paid_at + Duration::days(210)).date_naive();
        let mut slots = Vec::new();
        for week in 0..5 {
            slots.push(fx.slot("th-1", first_day + Duration::weeks(week), 10, 1).await);
        }
        let refs: Vec<&TimeSlot> = slots.iter().collect();
        let bookings = fx.book_confirmed(&payment, &refs).await;
        let therapist = Principal::therapist("th-1");
        fx.settlement
            .complete_session(&therapist, &bookings[0].id, None, Utc::now())
            .await
            .unwrap();
        fx.settlement
            .complete_session(&therapist, &bookings[1].id, None, Utc::now())
            .await
            .unwrap();

        let out = fx
            .bookings
            .cancel_package(&Principal::parent("parent-1"), &payment.id, paid_at + Duration::days(200))
            .await
            .unwrap();

        assert_eq!(out.used_sessions, 2);
        assert_eq!(out.refund.basis, 300_000);
        assert_eq!(out.refund.tier, RefundTier::PackageProcessingFee);
        assert_eq!(out.refund.refund_amount, 270_000);
        assert!(out.session_refunds.is_empty());
        assert_eq!(out.total_refund, 270_000);
        assert_eq!(out.cancelled_booking_ids.len(), 3);

        for b in &bookings[2..] {
            let stored = fx.repos.bookings().find_by_id(&b.id).await.unwrap().unwrap();
            assert_eq!(stored.status, BookingStatus::Cancelled);
            assert_eq!(stored.refund_amount, 90_000);
            assert_eq!(fx.slots.get(&b.slot_id).await.unwrap().current_bookings, 0);
        }
    }

    #[tokio::test]
    async fn package_cancellation_keeps_time_tiers_for_short_notice_sessions() {
        let fx = Fixture::new();
        let parent = Principal::parent("parent-1");

        let single = fx.paid_payment(1, 70_000, 0).await;
        let day = (single.paid_at.unwrap() + Duration::days(10)).date_naive();
        let lone = fx.slot("th-1", day, 9, 1).await;
        fx.book_confirmed(&single, &[&lone]).await;
        assert!(matches!(
            fx.bookings
                .cancel_package(&parent, &single.id, start_of(&lone) - Duration::hours(1))
                .await,
            Err(DomainError::Validation(_))
        ));

        // 2 x 50,000: the first session starts in an hour, the second in two weeks
        let payment = fx.paid_payment(2, 100_000, 0).await;
        let soon = fx.slot("th-1", day, 14, 1).await;
        let later = fx.slot("th-1", day + Duration::weeks(2), 14, 1).await;
        let bookings = fx.book_confirmed(&payment, &[&soon, &later]).await;
        let at = start_of(&soon) - Duration::hours(1);

        let out = fx.bookings.cancel_package(&parent, &payment.id, at).await.unwrap();
        assert_eq!(out.used_sessions, 1);
        assert_eq!(out.session_refunds.len(), 1);
        assert_eq!(out.session_refunds[0].booking_id, bookings[0].id);
        assert_eq!(out.session_refunds[0].refund.tier, RefundTier::ParentLastMinute);
        assert_eq!(out.session_refunds[0].refund.refund_amount, 0);
        assert_eq!(out.refund.tier, RefundTier::PackageFull);
        assert_eq!(out.refund.basis, 50_000);
        assert_eq!(out.total_refund, 50_000);
        assert_eq!(out.cancelled_booking_ids, vec![bookings[0].id.clone(), bookings[1].id.clone()]);

        let stored = fx.payments.get(&parent, &payment.id).await.unwrap();
        assert_eq!(stored.refunded_amount, 50_000);
        assert_eq!(stored.status, PaymentStatus::PartiallyRefunded);
        for (booking, refund) in bookings.iter().zip([0, 50_000]) {
            let b = fx.repos.bookings().find_by_id(&booking.id).await.unwrap().unwrap();
            assert_eq!(b.status, BookingStatus::Cancelled);
            assert_eq!(b.refund_amount, refund);
            assert_eq!(fx.slots.get(&b.slot_id).await.unwrap().current_bookings, 0);
        }
    }

    #[tokio::test]
    async fn status_counts_cover_every_status() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(2, 100_000, 0).await;
        let a = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let b = fx.slot("th-1", date(2026, 3, 3), 10, 1).await;
        let bookings = fx.book(&payment, &[&a, &b]).await;
        fx.bookings
            .confirm(&Principal::therapist("th-1"), &bookings[0].id)
            .await
            .unwrap();

        let counts = fx
            .bookings
            .therapist_status_counts(&Principal::therapist("th-1"), "th-1")
            .await
            .unwrap();
        assert_eq!(counts.len(), BookingStatus::ALL.len());
        assert_eq!(counts[&BookingStatus::Confirmed], 1);
        assert_eq!(counts[&BookingStatus::PendingConfirmation], 1);
        assert_eq!(counts[&BookingStatus::NoShow], 0);

        let listed = fx
            .bookings
            .list_for_parent(
                &Principal::parent("parent-1"),
                "parent-1",
                &BookingFilter {
                    statuses: vec![BookingStatus::Confirmed],
                    ..Default::default()
                },
                PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(
            listed.items[0].display_status,
            DisplayStatus::Booking(BookingStatus::Confirmed)
        );
    }

    #[test]
    fn split_evenly_sums_to_total() {
        assert_eq!(split_evenly(100, 3), vec![34, 33, 33]);
        assert_eq!(split_evenly(0, 2), vec![0, 0]);
        assert!(split_evenly(10, 0).is_empty());
    }
}
