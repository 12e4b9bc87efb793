//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `WriteBatch`: the unit of atomic change across payments, bookings,
//!   refund requests and ledger entries
//! - `DomainResult`: standard result type for domain operations
//!
//! Reads go through the per-aggregate repositories. Every write that touches
//! more than one row of those four tables is collected into a `WriteBatch`
//! and applied with [`RepositoryProvider::commit`], which is all-or-nothing.
//! Slot capacity counters are the only exception: they are changed by the
//! atomic `try_reserve` / `release` calls on `SlotRepository`.

use async_trait::async_trait;

use super::booking::{Booking, BookingRepository};
use super::ledger::{LedgerEntry, LedgerRepository};
use super::payment::{Payment, PaymentRepository};
use super::refund_request::{RefundRequest, RefundRequestRepository};
use super::slot::SlotRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// One row change inside a [`WriteBatch`].
///
/// Updates are optimistic: the stored row must still carry the entity's
/// `version`, and is written back with `version + 1`.
#[derive(Debug, Clone)]
pub enum Write {
    InsertPayment(Payment),
    UpdatePayment(Payment),
    InsertBooking(Booking),
    UpdateBooking(Booking),
    InsertRefundRequest(RefundRequest),
    UpdateRefundRequest(RefundRequest),
    InsertLedgerEntry(LedgerEntry),
    UpdateLedgerEntry(LedgerEntry),
}

impl Write {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::InsertPayment(_) | Self::UpdatePayment(_) => "Payment",
            Self::InsertBooking(_) | Self::UpdateBooking(_) => "Booking",
            Self::InsertRefundRequest(_) | Self::UpdateRefundRequest(_) => "RefundRequest",
            Self::InsertLedgerEntry(_) | Self::UpdateLedgerEntry(_) => "LedgerEntry",
        }
    }
}

/// Ordered set of writes applied atomically
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn insert_payment(&mut self, p: Payment) -> &mut Self {
        self.push(Write::InsertPayment(p))
    }

    pub fn update_payment(&mut self, p: Payment) -> &mut Self {
        self.push(Write::UpdatePayment(p))
    }

    pub fn insert_booking(&mut self, b: Booking) -> &mut Self {
        self.push(Write::InsertBooking(b))
    }

    pub fn update_booking(&mut self, b: Booking) -> &mut Self {
        self.push(Write::UpdateBooking(b))
    }

    pub fn insert_refund_request(&mut self, r: RefundRequest) -> &mut Self {
        self.push(Write::InsertRefundRequest(r))
    }

    pub fn update_refund_request(&mut self, r: RefundRequest) -> &mut Self {
        self.push(Write::UpdateRefundRequest(r))
    }

    pub fn insert_ledger_entry(&mut self, e: LedgerEntry) -> &mut Self {
        self.push(Write::InsertLedgerEntry(e))
    }

    pub fn update_ledger_entry(&mut self, e: LedgerEntry) -> &mut Self {
        self.push(Write::UpdateLedgerEntry(e))
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) -> DomainResult<()> {
///     let mut payment = repos.payments().find_by_id("p-1").await?.unwrap();
///     payment.mark_paid(Utc::now())?;
///     let mut batch = WriteBatch::new();
///     batch.update_payment(payment);
///     repos.commit(batch).await
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn slots(&self) -> &dyn SlotRepository;
    fn payments(&self) -> &dyn PaymentRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn refund_requests(&self) -> &dyn RefundRequestRepository;
    fn ledger(&self) -> &dyn LedgerRepository;

    /// Apply every write or none of them.
    ///
    /// A stale version on any update fails the whole batch with
    /// `DomainError::Conflict`.
    async fn commit(&self, batch: WriteBatch) -> DomainResult<()>;
}
