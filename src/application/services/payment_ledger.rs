//! Payment amounts and status: the source of truth for money owed and collected

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::principal::Principal;
use crate::domain::{
    Booking, DomainError, DomainResult, LedgerEntry, LedgerEntryKind, Money, NewPayment,
    PackageSummary, Payment, PaymentFilter, ProfileDirectory, RepositoryProvider,
    SettlementCalculator, WriteBatch,
};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

pub struct PaymentLedger {
    repos: Arc<dyn RepositoryProvider>,
    profiles: Arc<dyn ProfileDirectory>,
    calculator: SettlementCalculator,
}

impl PaymentLedger {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        profiles: Arc<dyn ProfileDirectory>,
        calculator: SettlementCalculator,
    ) -> Self {
        Self {
            repos,
            profiles,
            calculator,
        }
    }

    /// Record a purchase. The payment id doubles as the booking group key.
    pub async fn create_payment(
        &self,
        principal: &Principal,
        input: NewPayment,
    ) -> DomainResult<Payment> {
        principal.ensure_parent(&input.parent_id)?;
        if !self.profiles.therapist_exists(&input.therapist_id).await? {
            return Err(DomainError::not_found("Therapist", input.therapist_id.clone()));
        }
        if !self
            .profiles
            .child_belongs_to(&input.parent_id, &input.child_id)
            .await?
        {
            return Err(DomainError::not_found("Child", input.child_id.clone()));
        }

        let payment = Payment::new(input)?;
        let mut batch = WriteBatch::new();
        batch.insert_payment(payment.clone());
        self.repos.commit(batch).await?;

        info!(
            payment_id = %payment.id,
            parent_id = %payment.parent_id,
            therapist_id = %payment.therapist_id,
            sessions = payment.total_sessions,
            final_fee = payment.final_fee,
            "Payment created"
        );
        Ok(payment)
    }

    pub async fn get(&self, principal: &Principal, payment_id: &str) -> DomainResult<Payment> {
        let payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_can_view_payment(&payment)?;
        Ok(payment)
    }

    /// Confirmation from the payment gateway (relayed by the owner or an admin).
    pub async fn mark_paid(
        &self,
        principal: &Principal,
        payment_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Payment> {
        let mut payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_parent(&payment.parent_id)?;
        payment.mark_paid(at)?;
        self.save(&payment).await?;
        info!(payment_id, "Payment marked paid");
        Ok(payment)
    }

    pub async fn mark_failed(&self, principal: &Principal, payment_id: &str) -> DomainResult<Payment> {
        let mut payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_parent(&payment.parent_id)?;
        payment.mark_failed()?;
        self.save(&payment).await?;
        info!(payment_id, "Payment marked failed");
        Ok(payment)
    }

    /// Manual refund by an administrator, amount in `[1, refundable]`.
    pub async fn apply_refund(
        &self,
        principal: &Principal,
        payment_id: &str,
        amount: Money,
    ) -> DomainResult<Payment> {
        principal.ensure_admin()?;
        let mut payment = load_payment(self.repos.as_ref(), payment_id).await?;
        if amount < 1 {
            return Err(DomainError::Validation("refund amount must be at least 1".into()));
        }
        payment.apply_refund(amount)?;

        let mut batch = WriteBatch::new();
        batch.update_payment(payment.clone());
        let adjustment = carry_refund(
            self.repos.as_ref(),
            &self.calculator,
            &mut batch,
            &payment,
            None,
            amount,
        )
        .await?;
        self.repos.commit(batch).await?;

        info!(
            payment_id,
            amount,
            status = %payment.status,
            adjustment = adjustment.as_ref().map(|e| e.amount),
            "Refund applied"
        );
        Ok(payment)
    }

    pub async fn list_for_parent(
        &self,
        principal: &Principal,
        parent_id: &str,
        filter: &PaymentFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Payment>> {
        principal.ensure_parent(parent_id)?;
        self.repos
            .payments()
            .find_for_parent(parent_id, filter, page)
            .await
    }

    /// One row per booking group with its fee and session progress.
    pub async fn package_summaries(
        &self,
        principal: &Principal,
        parent_id: &str,
        filter: &PaymentFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<PackageSummary>> {
        let payments = self.list_for_parent(principal, parent_id, filter, page).await?;
        Ok(payments.map(|p| PackageSummary {
            group_key: p.group_key().to_string(),
            session_type: p.session_type,
            payment_status: p.status,
            total_fee: p.final_fee,
            total_sessions: p.total_sessions,
            completed_sessions: p.completed_sessions,
        }))
    }

    /// Compensation credits owed to a parent.
    pub async fn parent_credits(
        &self,
        principal: &Principal,
        parent_id: &str,
    ) -> DomainResult<Vec<LedgerEntry>> {
        principal.ensure_parent(parent_id)?;
        self.repos.ledger().parent_credits(parent_id).await
    }

    async fn save(&self, payment: &Payment) -> DomainResult<()> {
        let mut batch = WriteBatch::new();
        batch.update_payment(payment.clone());
        self.repos.commit(batch).await
    }
}

pub(crate) async fn load_payment(
    repos: &dyn RepositoryProvider,
    payment_id: &str,
) -> DomainResult<Payment> {
    repos
        .payments()
        .find_by_id(payment_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Payment", payment_id))
}

/// Carry a refund already applied to `payment` over to the therapist side.
///
/// Once the payment is settled the frozen payout stays as it is and the
/// therapist's share of the refund becomes a `RefundAdjustment` against the
/// next one. Before that the amount is booked on the named session, or spread
/// over the payment's sessions in order, so refunded sessions drop out of the
/// settlement sum.
pub(crate) async fn carry_refund(
    repos: &dyn RepositoryProvider,
    calculator: &SettlementCalculator,
    batch: &mut WriteBatch,
    payment: &Payment,
    booking_id: Option<&str>,
    amount: Money,
) -> DomainResult<Option<LedgerEntry>> {
    if amount <= 0 {
        return Ok(None);
    }
    if payment.is_settled() {
        let share = calculator.therapist_share(amount);
        if share <= 0 {
            return Ok(None);
        }
        let entry = LedgerEntry::new(
            LedgerEntryKind::RefundAdjustment,
            payment.therapist_id.clone(),
            payment.parent_id.clone(),
            Some(payment.id.clone()),
            booking_id.map(str::to_string),
            share,
        );
        batch.insert_ledger_entry(entry.clone());
        return Ok(Some(entry));
    }

    let now = Utc::now();
    if let Some(id) = booking_id {
        let mut booking = repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", id))?;
        booking.refund_amount = (booking.refund_amount + amount).min(booking.fee_share);
        booking.updated_at = now;
        batch.update_booking(booking);
        return Ok(None);
    }

    // Sessions that can still be paid out absorb the refund first.
    let mut bookings = repos.bookings().find_by_payment(&payment.id).await?;
    bookings.sort_by_key(|b| (!counts_for_settlement(b), b.session_number));
    let mut remaining = amount;
    for mut booking in bookings {
        if remaining == 0 {
            break;
        }
        let take = booking.collected_fee().min(remaining);
        if take == 0 {
            continue;
        }
        booking.refund_amount += take;
        booking.updated_at = now;
        remaining -= take;
        batch.update_booking(booking);
    }
    Ok(None)
}

fn counts_for_settlement(booking: &Booking) -> bool {
    booking.holds_slot() || booking.status.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures::{date, Fixture};
    use crate::domain::{PaymentStatus, SessionType};

    #[tokio::test]
    async fn create_requires_known_profiles_and_ownership() {
        let fx = Fixture::new();
        let parent = Principal::parent("parent-1");

        let mut input = fx.new_payment(3, 300_000, 30);
        input.child_id = "someone-elses-child".into();
        assert!(matches!(
            fx.payments.create_payment(&parent, input).await,
            Err(DomainError::NotFound { entity: "Child", .. })
        ));

        let mut input = fx.new_payment(3, 300_000, 30);
        input.therapist_id = "ghost".into();
        assert!(matches!(
            fx.payments.create_payment(&parent, input).await,
            Err(DomainError::NotFound { entity: "Therapist", .. })
        ));

        let other = Principal::parent("parent-2");
        assert!(matches!(
            fx.payments.create_payment(&other, fx.new_payment(1, 1000, 0)).await,
            Err(DomainError::Forbidden(_))
        ));

        let p = fx
            .payments
            .create_payment(&parent, fx.new_payment(3, 300_000, 30))
            .await
            .unwrap();
        assert_eq!(p.final_fee, 210_000);
        assert_eq!(p.status, PaymentStatus::PendingPayment);
    }

    #[tokio::test]
    async fn refunds_are_bounded_by_paid_amount() {
        let fx = Fixture::new();
        let p = fx.paid_payment(1, 50_000, 0).await;
        let admin = Principal::admin("admin");

        assert!(matches!(
            fx.payments.apply_refund(&admin, &p.id, 0).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            fx.payments.apply_refund(&admin, &p.id, 50_001).await,
            Err(DomainError::Validation(_))
        ));

        let partial = fx.payments.apply_refund(&admin, &p.id, 20_000).await.unwrap();
        assert_eq!(partial.status, PaymentStatus::PartiallyRefunded);
        let full = fx.payments.apply_refund(&admin, &p.id, 30_000).await.unwrap();
        assert_eq!(full.status, PaymentStatus::Refunded);
        assert_eq!(full.refunded_amount, 50_000);
    }

    #[tokio::test]
    async fn manual_refund_before_settlement_drops_the_session() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(2, 100_000, 0).await;
        let a = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let b = fx.slot("th-1", date(2026, 3, 9), 10, 1).await;
        let bookings = fx.book_confirmed(&payment, &[&a, &b]).await;
        let admin = Principal::admin("admin");

        fx.payments.apply_refund(&admin, &payment.id, 30_000).await.unwrap();
        let therapist = Principal::therapist("th-1");
        for booking in &bookings {
            fx.settlement
                .complete_session(&therapist, &booking.id, None, Utc::now())
                .await
                .unwrap();
        }
        let payout = fx
            .settlement
            .confirm_payout(&admin, &payment.id, Utc::now(), None)
            .await
            .unwrap();
        assert_eq!(payout.breakdown.sessions, 1);
        assert_eq!(payout.breakdown.net, 40_000);
        assert!(payout.carried_deficit.is_none());
    }

    #[tokio::test]
    async fn manual_refund_after_settlement_becomes_adjustment() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 50_000, 0).await;
        let slot = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let booking = fx.book_confirmed(&payment, &[&slot]).await.remove(0);
        fx.settlement
            .complete_session(&Principal::therapist("th-1"), &booking.id, None, Utc::now())
            .await
            .unwrap();
        let admin = Principal::admin("admin");
        fx.settlement
            .confirm_payout(&admin, &payment.id, Utc::now(), None)
            .await
            .unwrap();

        let refunded = fx.payments.apply_refund(&admin, &payment.id, 10_000).await.unwrap();
        assert_eq!(refunded.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(refunded.settlement_amount, Some(40_000));

        let owed = fx.repos.ledger().outstanding_deductions("th-1").await.unwrap();
        assert_eq!(owed.len(), 1);
        assert_eq!(owed[0].kind, crate::domain::LedgerEntryKind::RefundAdjustment);
        assert_eq!(owed[0].amount, 8_000);
        assert_eq!(owed[0].payment_id.as_deref(), Some(payment.id.as_str()));
    }

    #[tokio::test]
    async fn package_summaries_group_by_payment() {
        let fx = Fixture::new();
        fx.paid_payment(3, 300_000, 30).await;
        fx.paid_payment(1, 80_000, 0).await;

        let summaries = fx
            .payments
            .package_summaries(
                &Principal::parent("parent-1"),
                "parent-1",
                &PaymentFilter {
                    session_type: Some(SessionType::Therapy),
                    ..Default::default()
                },
                PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(summaries.total, 2);
        let totals: Vec<Money> = summaries.items.iter().map(|s| s.total_fee).collect();
        assert!(totals.contains(&210_000));
        assert!(totals.contains(&80_000));
        assert!(summaries.items.iter().all(|s| s.completed_sessions == 0));
    }
}
