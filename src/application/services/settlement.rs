//! Session completion and therapist payout

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::payment_ledger::load_payment;
use crate::application::principal::Principal;
use crate::domain::status::ensure_booking_transition;
use crate::domain::{
    Booking, BookingStatus, DomainError, DomainResult, LedgerEntry, LedgerEntryKind, Money,
    Payment, RepositoryProvider, SettlementBreakdown, SettlementCalculator, WriteBatch,
};

#[derive(Debug, Clone)]
pub struct SessionCompletion {
    pub booking: Booking,
    pub payment: Payment,
    /// Settlement as it would be paid out right now
    pub preview: SettlementBreakdown,
}

#[derive(Debug, Clone)]
pub struct PayoutConfirmation {
    pub payment: Payment,
    pub breakdown: SettlementBreakdown,
    /// Deductions consumed by this payout
    pub applied_entries: Vec<LedgerEntry>,
    pub carried_deficit: Option<LedgerEntry>,
}

pub struct SettlementEngine {
    repos: Arc<dyn RepositoryProvider>,
    calculator: SettlementCalculator,
}

impl SettlementEngine {
    pub fn new(repos: Arc<dyn RepositoryProvider>, calculator: SettlementCalculator) -> Self {
        Self { repos, calculator }
    }

    pub fn calculator(&self) -> &SettlementCalculator {
        &self.calculator
    }

    /// Therapist marks a confirmed session as held.
    ///
    /// Moves the booking to PENDING_SETTLEMENT, bumps the payment's completed
    /// counter and refreshes its provisional `settlement_amount`.
    pub async fn complete_session(
        &self,
        principal: &Principal,
        booking_id: &str,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<SessionCompletion> {
        let mut booking = self
            .repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
        principal.ensure_therapist(&booking.therapist_id)?;
        let mut payment = load_payment(self.repos.as_ref(), &booking.payment_id).await?;
        ensure_booking_transition(booking.status, BookingStatus::PendingSettlement, payment.status)?;

        booking.status = BookingStatus::PendingSettlement;
        booking.completed_at = Some(at);
        booking.therapist_note = note;
        booking.updated_at = Utc::now();

        let siblings: Vec<Booking> = self
            .repos
            .bookings()
            .find_by_payment(&payment.id)
            .await?
            .into_iter()
            .map(|b| if b.id == booking.id { booking.clone() } else { b })
            .collect();
        let deductions = self.outstanding_amounts(&payment.therapist_id).await?;
        let preview = self.compute(&siblings, &deductions);

        payment.completed_sessions += 1;
        payment.settlement_amount = Some(preview.net);
        payment.updated_at = Utc::now();

        let mut batch = WriteBatch::new();
        batch
            .update_booking(booking.clone())
            .update_payment(payment.clone());
        self.repos.commit(batch).await?;

        info!(
            booking_id,
            payment_id = %payment.id,
            completed = payment.completed_sessions,
            total = payment.total_sessions,
            preview_net = preview.net,
            "Session completed"
        );
        Ok(SessionCompletion {
            booking,
            payment,
            preview,
        })
    }

    /// Current settlement figures for a payment, without writing anything.
    pub async fn preview(
        &self,
        principal: &Principal,
        payment_id: &str,
    ) -> DomainResult<SettlementBreakdown> {
        let payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_therapist(&payment.therapist_id)?;
        let bookings = self.repos.bookings().find_by_payment(payment_id).await?;
        let deductions = if payment.is_settled() {
            Vec::new()
        } else {
            self.outstanding_amounts(&payment.therapist_id).await?
        };
        Ok(self.compute(&bookings, &deductions))
    }

    /// External payout confirmation: freeze the settlement.
    ///
    /// Every session must be past PENDING_CONFIRMATION / CONFIRMED. Outstanding
    /// deductions are consumed; anything they exceed is carried forward as a
    /// new deficit entry. The frozen amount is never recomputed afterwards.
    pub async fn confirm_payout(
        &self,
        principal: &Principal,
        payment_id: &str,
        at: DateTime<Utc>,
        note: Option<String>,
    ) -> DomainResult<PayoutConfirmation> {
        principal.ensure_admin()?;
        let mut payment = load_payment(self.repos.as_ref(), payment_id).await?;
        if payment.is_settled() {
            return Err(DomainError::InvalidStateTransition {
                entity: "Settlement",
                from: "SETTLED".into(),
                to: "SETTLED".into(),
            });
        }

        let mut bookings = self.repos.bookings().find_by_payment(payment_id).await?;
        if let Some(open) = bookings.iter().find(|b| b.holds_slot()) {
            return Err(DomainError::Validation(format!(
                "session {} of payment {} is still {}",
                open.session_number, payment_id, open.status
            )));
        }
        if !bookings
            .iter()
            .any(|b| b.status == BookingStatus::PendingSettlement)
        {
            return Err(DomainError::Validation(format!(
                "payment {} has no sessions awaiting settlement",
                payment_id
            )));
        }

        let mut entries = self
            .repos
            .ledger()
            .outstanding_deductions(&payment.therapist_id)
            .await?;
        let amounts: Vec<Money> = entries.iter().map(|e| e.amount).collect();
        let breakdown = self.compute(&bookings, &amounts);

        let mut batch = WriteBatch::new();
        for booking in bookings
            .iter_mut()
            .filter(|b| b.status == BookingStatus::PendingSettlement)
        {
            ensure_booking_transition(
                booking.status,
                BookingStatus::SettlementCompleted,
                payment.status,
            )?;
            booking.status = BookingStatus::SettlementCompleted;
            booking.updated_at = Utc::now();
            batch.update_booking(booking.clone());
        }
        for entry in entries.iter_mut() {
            entry.apply_to(payment.id.clone(), at);
            batch.update_ledger_entry(entry.clone());
        }
        let carried_deficit = (breakdown.carried_deficit > 0).then(|| {
            LedgerEntry::new(
                LedgerEntryKind::CarriedDeficit,
                payment.therapist_id.clone(),
                payment.parent_id.clone(),
                Some(payment.id.clone()),
                None,
                breakdown.carried_deficit,
            )
        });
        if let Some(entry) = &carried_deficit {
            batch.insert_ledger_entry(entry.clone());
        }

        payment.settlement_amount = Some(breakdown.net);
        payment.settled_at = Some(at);
        payment.settlement_note = note;
        payment.updated_at = Utc::now();
        batch.update_payment(payment.clone());
        self.repos.commit(batch).await?;

        metrics::counter!("booking_settlements_confirmed_total").increment(1);
        info!(
            payment_id,
            therapist_id = %payment.therapist_id,
            net = breakdown.net,
            deductions = breakdown.deductions,
            carried_deficit = breakdown.carried_deficit,
            "Settlement confirmed"
        );
        Ok(PayoutConfirmation {
            payment,
            breakdown,
            applied_entries: entries,
            carried_deficit,
        })
    }

    pub async fn therapist_ledger(
        &self,
        principal: &Principal,
        therapist_id: &str,
    ) -> DomainResult<Vec<LedgerEntry>> {
        principal.ensure_therapist(therapist_id)?;
        self.repos.ledger().find_for_therapist(therapist_id).await
    }

    fn compute(&self, bookings: &[Booking], deductions: &[Money]) -> SettlementBreakdown {
        let fees: Vec<Money> = bookings
            .iter()
            .filter(|b| b.is_settleable())
            .map(Booking::collected_fee)
            .collect();
        self.calculator.compute(&fees, deductions)
    }

    async fn outstanding_amounts(&self, therapist_id: &str) -> DomainResult<Vec<Money>> {
        Ok(self
            .repos
            .ledger()
            .outstanding_deductions(therapist_id)
            .await?
            .into_iter()
            .map(|e| e.amount)
            .collect())
    }
}
