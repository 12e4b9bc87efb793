//! In-memory repository provider for development and testing

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::{
    Booking, BookingFilter, BookingRepository, BookingStatus, DomainError, DomainResult, Holiday,
    LedgerEntry, LedgerEntryKind, LedgerRepository, Payment, PaymentFilter, PaymentRepository,
    RefundRequest, RefundRequestRepository, RepositoryProvider, SlotFlags, SlotQuery,
    SlotRepository, TimeSlot, Write, WriteBatch,
};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

type SlotKey = (String, NaiveDate, NaiveTime);
type GroupSessionKey = (String, i32);

/// DashMap-backed store with the same semantics as the SeaORM provider.
///
/// Slot counters are changed under the DashMap shard lock, so `try_reserve`
/// is a true check-and-increment. Batches are serialized by `commit_lock`
/// and validated in full before the first write is applied. A booking whose
/// `(group_key, session_number)` is already taken is a `Conflict`, as with the
/// unique index of the SQL schema.
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    slots: DashMap<String, TimeSlot>,
    slot_keys: DashMap<SlotKey, String>,
    holidays: DashMap<String, Holiday>,
    payments: DashMap<String, Payment>,
    bookings: DashMap<String, Booking>,
    group_sessions: DashMap<GroupSessionKey, String>,
    refund_requests: DashMap<String, RefundRequest>,
    ledger: DashMap<String, LedgerEntry>,
    commit_lock: Mutex<()>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, write: &Write) -> DomainResult<()> {
        fn stale(entity: &str, id: &str) -> DomainError {
            DomainError::Conflict(format!("{} {} was modified concurrently", entity, id))
        }
        fn duplicate(entity: &str, id: &str) -> DomainError {
            DomainError::Conflict(format!("{} {} already exists", entity, id))
        }

        match write {
            Write::InsertPayment(p) if self.payments.contains_key(&p.id) => {
                Err(duplicate("Payment", &p.id))
            }
            Write::InsertBooking(b) if self.bookings.contains_key(&b.id) => {
                Err(duplicate("Booking", &b.id))
            }
            Write::InsertBooking(b) if self.group_sessions.contains_key(&group_session(b)) => {
                Err(taken_session(b))
            }
            Write::InsertRefundRequest(r) if self.refund_requests.contains_key(&r.id) => {
                Err(duplicate("RefundRequest", &r.id))
            }
            Write::InsertLedgerEntry(e) if self.ledger.contains_key(&e.id) => {
                Err(duplicate("LedgerEntry", &e.id))
            }
            Write::UpdatePayment(p) => match self.payments.get(&p.id) {
                Some(stored) if stored.version == p.version => Ok(()),
                Some(_) => Err(stale("Payment", &p.id)),
                None => Err(DomainError::not_found("Payment", p.id.clone())),
            },
            Write::UpdateBooking(b) => match self.bookings.get(&b.id) {
                Some(stored) if stored.version == b.version => Ok(()),
                Some(_) => Err(stale("Booking", &b.id)),
                None => Err(DomainError::not_found("Booking", b.id.clone())),
            },
            Write::UpdateRefundRequest(r) => match self.refund_requests.get(&r.id) {
                Some(stored) if stored.version == r.version => Ok(()),
                Some(_) => Err(stale("RefundRequest", &r.id)),
                None => Err(DomainError::not_found("RefundRequest", r.id.clone())),
            },
            Write::UpdateLedgerEntry(e) => match self.ledger.get(&e.id) {
                Some(stored) if stored.version == e.version => Ok(()),
                Some(_) => Err(stale("LedgerEntry", &e.id)),
                None => Err(DomainError::not_found("LedgerEntry", e.id.clone())),
            },
            _ => Ok(()),
        }
    }

    fn apply(&self, write: Write) {
        match write {
            Write::InsertPayment(p) => {
                self.payments.insert(p.id.clone(), p);
            }
            Write::UpdatePayment(mut p) => {
                p.version += 1;
                self.payments.insert(p.id.clone(), p);
            }
            Write::InsertBooking(b) => {
                self.group_sessions.insert(group_session(&b), b.id.clone());
                self.bookings.insert(b.id.clone(), b);
            }
            Write::UpdateBooking(mut b) => {
                b.version += 1;
                self.bookings.insert(b.id.clone(), b);
            }
            Write::InsertRefundRequest(r) => {
                self.refund_requests.insert(r.id.clone(), r);
            }
            Write::UpdateRefundRequest(mut r) => {
                r.version += 1;
                self.refund_requests.insert(r.id.clone(), r);
            }
            Write::InsertLedgerEntry(e) => {
                self.ledger.insert(e.id.clone(), e);
            }
            Write::UpdateLedgerEntry(mut e) => {
                e.version += 1;
                self.ledger.insert(e.id.clone(), e);
            }
        }
    }

    fn bookings_where(
        &self,
        pred: impl Fn(&Booking) -> bool,
        filter: &BookingFilter,
    ) -> Vec<Booking> {
        let mut items: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| pred(b.value()) && filter.matches_booking(b.value()))
            .filter(|b| match filter.session_type {
                Some(kind) => self
                    .payments
                    .get(&b.payment_id)
                    .map_or(false, |p| p.session_type == kind),
                None => true,
            })
            .map(|b| b.value().clone())
            .collect();
        items.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.session_number.cmp(&b.session_number))
        });
        items
    }
}

fn group_session(b: &Booking) -> GroupSessionKey {
    (b.group_key.clone(), b.session_number)
}

fn taken_session(b: &Booking) -> DomainError {
    DomainError::Conflict(format!(
        "session {} of group {} already booked",
        b.session_number, b.group_key
    ))
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        self
    }

    fn payments(&self) -> &dyn PaymentRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }

    fn refund_requests(&self) -> &dyn RefundRequestRepository {
        self
    }

    fn ledger(&self) -> &dyn LedgerRepository {
        self
    }

    async fn commit(&self, batch: WriteBatch) -> DomainResult<()> {
        let _guard = self.commit_lock.lock().await;
        let mut batch_sessions = HashSet::new();
        for write in batch.writes() {
            self.check(write)?;
            if let Write::InsertBooking(b) = write {
                if !batch_sessions.insert(group_session(b)) {
                    return Err(taken_session(b));
                }
            }
        }
        for write in batch.into_writes() {
            self.apply(write);
        }
        Ok(())
    }
}

#[async_trait]
impl SlotRepository for InMemoryRepositoryProvider {
    async fn insert_many(&self, slots: Vec<TimeSlot>) -> DomainResult<u64> {
        let mut created = 0;
        for slot in slots {
            let key = (slot.therapist_id.clone(), slot.date, slot.start_time);
            if let dashmap::mapref::entry::Entry::Vacant(vacant) = self.slot_keys.entry(key) {
                vacant.insert(slot.id.clone());
                self.slots.insert(slot.id.clone(), slot);
                created += 1;
            }
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<TimeSlot>> {
        Ok(self.slots.get(id).map(|s| s.value().clone()))
    }

    async fn existing_starts(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<HashSet<(NaiveDate, NaiveTime)>> {
        Ok(self
            .slot_keys
            .iter()
            .filter(|e| e.key().0 == therapist_id && e.key().1 >= from && e.key().1 <= to)
            .map(|e| (e.key().1, e.key().2))
            .collect())
    }

    async fn search(&self, query: &SlotQuery) -> DomainResult<Vec<TimeSlot>> {
        let mut items: Vec<TimeSlot> = self
            .slots
            .iter()
            .filter(|s| s.value().matches(query))
            .map(|s| s.value().clone())
            .collect();
        items.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(items)
    }

    async fn list_for_therapist(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<TimeSlot>> {
        let mut items: Vec<TimeSlot> = self
            .slots
            .iter()
            .filter(|s| s.therapist_id == therapist_id && s.date >= from && s.date <= to)
            .map(|s| s.value().clone())
            .collect();
        items.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(items)
    }

    async fn try_reserve(&self, id: &str) -> DomainResult<bool> {
        match self.slots.get_mut(id) {
            Some(mut slot) if slot.is_bookable() => {
                slot.current_bookings += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, id: &str) -> DomainResult<bool> {
        match self.slots.get_mut(id) {
            Some(mut slot) if slot.current_bookings > 0 => {
                slot.current_bookings -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_flags(&self, id: &str, flags: &SlotFlags) -> DomainResult<Option<TimeSlot>> {
        Ok(self.slots.get_mut(id).map(|mut slot| {
            flags.apply(&mut slot);
            slot.clone()
        }))
    }

    async fn add_holiday(&self, holiday: Holiday) -> DomainResult<()> {
        self.holidays.insert(holiday.id.clone(), holiday);
        Ok(())
    }

    async fn mark_holiday(&self, therapist_id: Option<&str>, date: NaiveDate) -> DomainResult<u64> {
        let mut flagged = 0;
        for mut slot in self.slots.iter_mut() {
            let owned = therapist_id.map_or(true, |t| slot.therapist_id == t);
            if owned && slot.date == date && !slot.is_holiday {
                slot.is_holiday = true;
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    async fn holiday_dates(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<HashSet<NaiveDate>> {
        Ok(self
            .holidays
            .iter()
            .filter(|h| h.date >= from && h.date <= to)
            .filter(|h| h.therapist_id.as_deref().map_or(true, |t| t == therapist_id))
            .map(|h| h.date)
            .collect())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>> {
        Ok(self.payments.get(id).map(|p| p.value().clone()))
    }

    async fn find_for_parent(
        &self,
        parent_id: &str,
        filter: &PaymentFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Payment>> {
        let mut items: Vec<Payment> = self
            .payments
            .iter()
            .filter(|p| p.parent_id == parent_id && filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PaginatedResult::from_vec(items, page))
    }
}

#[async_trait]
impl BookingRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(id).map(|b| b.value().clone()))
    }

    async fn find_by_payment(&self, payment_id: &str) -> DomainResult<Vec<Booking>> {
        let mut items: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.payment_id == payment_id)
            .map(|b| b.value().clone())
            .collect();
        items.sort_by_key(|b| b.session_number);
        Ok(items)
    }

    async fn find_for_parent(
        &self,
        parent_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>> {
        let items = self.bookings_where(|b| b.parent_id == parent_id, filter);
        Ok(PaginatedResult::from_vec(items, page))
    }

    async fn find_for_therapist(
        &self,
        therapist_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>> {
        let items = self.bookings_where(|b| b.therapist_id == therapist_id, filter);
        Ok(PaginatedResult::from_vec(items, page))
    }

    async fn status_counts_for_therapist(
        &self,
        therapist_id: &str,
    ) -> DomainResult<BTreeMap<BookingStatus, u64>> {
        let mut counts = BTreeMap::new();
        for b in self.bookings.iter().filter(|b| b.therapist_id == therapist_id) {
            *counts.entry(b.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl RefundRequestRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RefundRequest>> {
        Ok(self.refund_requests.get(id).map(|r| r.value().clone()))
    }

    async fn find_by_payment(&self, payment_id: &str) -> DomainResult<Vec<RefundRequest>> {
        let mut items: Vec<RefundRequest> = self
            .refund_requests
            .iter()
            .filter(|r| r.payment_id == payment_id)
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn find_pending(
        &self,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<RefundRequest>> {
        let mut items: Vec<RefundRequest> = self
            .refund_requests
            .iter()
            .filter(|r| r.is_pending())
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(PaginatedResult::from_vec(items, page))
    }
}

#[async_trait]
impl LedgerRepository for InMemoryRepositoryProvider {
    async fn outstanding_deductions(&self, therapist_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let mut items: Vec<LedgerEntry> = self
            .ledger
            .iter()
            .filter(|e| {
                e.therapist_id == therapist_id && e.kind.is_therapist_deduction() && e.is_outstanding()
            })
            .map(|e| e.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn parent_credits(&self, parent_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let mut items: Vec<LedgerEntry> = self
            .ledger
            .iter()
            .filter(|e| e.parent_id == parent_id && e.kind == LedgerEntryKind::ParentCompensation)
            .map(|e| e.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn find_for_therapist(&self, therapist_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let mut items: Vec<LedgerEntry> = self
            .ledger
            .iter()
            .filter(|e| e.therapist_id == therapist_id)
            .map(|e| e.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }
}
