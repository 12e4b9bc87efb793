//! Parent-submitted refund requests and their administrative resolution

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::payment_ledger::{carry_refund, load_payment};
use crate::application::principal::Principal;
use crate::domain::{
    DomainError, DomainResult, LedgerEntry, Money, Payment, RefundRequest, RepositoryProvider,
    SettlementCalculator, WriteBatch,
};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

#[derive(Debug, Clone)]
pub struct RefundResolution {
    pub request: RefundRequest,
    pub payment: Payment,
    /// Set when the refund hit an already-settled payment
    pub adjustment: Option<LedgerEntry>,
}

pub struct RefundRequestService {
    repos: Arc<dyn RepositoryProvider>,
    calculator: SettlementCalculator,
}

impl RefundRequestService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, calculator: SettlementCalculator) -> Self {
        Self { repos, calculator }
    }

    pub async fn submit(
        &self,
        principal: &Principal,
        payment_id: &str,
        booking_id: Option<String>,
        amount: Money,
        reason: String,
    ) -> DomainResult<RefundRequest> {
        let payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_parent(&payment.parent_id)?;
        if reason.trim().is_empty() {
            return Err(DomainError::Validation("reason must not be empty".into()));
        }
        check_amount(&payment, amount)?;
        if let Some(id) = &booking_id {
            let booking = self
                .repos
                .bookings()
                .find_by_id(id)
                .await?
                .ok_or_else(|| DomainError::not_found("Booking", id.clone()))?;
            if booking.payment_id != payment.id {
                return Err(DomainError::Validation(format!(
                    "booking {} does not belong to payment {}",
                    id, payment.id
                )));
            }
        }

        let request = RefundRequest::new(
            payment.id.clone(),
            booking_id,
            payment.parent_id.clone(),
            amount,
            reason,
        );
        let mut batch = WriteBatch::new();
        batch.insert_refund_request(request.clone());
        self.repos.commit(batch).await?;

        info!(request_id = %request.id, payment_id, amount, "Refund requested");
        Ok(request)
    }

    /// Approve or reject a pending request.
    ///
    /// Approved money reaches the therapist side through [`carry_refund`]:
    /// a deduction on the next payout once settled, a refunded session before.
    pub async fn resolve(
        &self,
        principal: &Principal,
        request_id: &str,
        approve: bool,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<RefundResolution> {
        principal.ensure_admin()?;
        let mut request = self
            .repos
            .refund_requests()
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("RefundRequest", request_id))?;
        if !request.is_pending() {
            return Err(DomainError::InvalidStateTransition {
                entity: "RefundRequest",
                from: request.status.to_string(),
                to: if approve { "APPROVED" } else { "REJECTED" }.into(),
            });
        }
        let mut payment = load_payment(self.repos.as_ref(), &request.payment_id).await?;

        request.resolve(approve, principal.id.clone(), at, note);
        let mut batch = WriteBatch::new();
        batch.update_refund_request(request.clone());

        let adjustment = if approve {
            let amount = request.requested_amount;
            check_amount(&payment, amount)?;
            payment.apply_refund(amount)?;
            batch.update_payment(payment.clone());
            carry_refund(
                self.repos.as_ref(),
                &self.calculator,
                &mut batch,
                &payment,
                request.booking_id.as_deref(),
                amount,
            )
            .await?
        } else {
            None
        };
        self.repos.commit(batch).await?;

        info!(
            request_id,
            approved = approve,
            adjustment = adjustment.as_ref().map(|e| e.amount),
            "Refund request resolved"
        );
        Ok(RefundResolution {
            request,
            payment,
            adjustment,
        })
    }

    pub async fn list_pending(
        &self,
        principal: &Principal,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<RefundRequest>> {
        principal.ensure_admin()?;
        self.repos.refund_requests().find_pending(page).await
    }

    pub async fn list_for_payment(
        &self,
        principal: &Principal,
        payment_id: &str,
    ) -> DomainResult<Vec<RefundRequest>> {
        let payment = load_payment(self.repos.as_ref(), payment_id).await?;
        principal.ensure_can_view_payment(&payment)?;
        self.repos.refund_requests().find_by_payment(payment_id).await
    }
}

fn check_amount(payment: &Payment, amount: Money) -> DomainResult<()> {
    let refundable = payment.refundable();
    if amount < 1 || amount > refundable {
        return Err(DomainError::Validation(format!(
            "refund amount {} outside [1, {}]",
            amount, refundable
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures::{date, Fixture};
    use crate::domain::{BookingStatus, LedgerEntryKind, PaymentStatus, RefundRequestStatus};

    #[tokio::test]
    async fn submit_validates_amount_and_owner() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 50_000, 0).await;
        let parent = Principal::parent("parent-1");

        for bad in [0, 50_001] {
            assert!(matches!(
                fx.refunds
                    .submit(&parent, &payment.id, None, bad, "sick".into())
                    .await,
                Err(DomainError::Validation(_))
            ));
        }
        assert!(matches!(
            fx.refunds
                .submit(&Principal::parent("parent-2"), &payment.id, None, 10, "x".into())
                .await,
            Err(DomainError::Forbidden(_))
        ));

        let unpaid = fx.unpaid_payment(1, 50_000, 0).await;
        assert!(matches!(
            fx.refunds.submit(&parent, &unpaid.id, None, 1, "x".into()).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn approval_before_settlement_excludes_session() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(2, 100_000, 0).await;
        let a = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let b = fx.slot("th-1", date(2026, 3, 9), 10, 1).await;
        let bookings = fx.book_confirmed(&payment, &[&a, &b]).await;
        let therapist = Principal::therapist("th-1");
        for booking in &bookings {
            fx.settlement
                .complete_session(&therapist, &booking.id, None, Utc::now())
                .await
                .unwrap();
        }

        let req = fx
            .refunds
            .submit(
                &Principal::parent("parent-1"),
                &payment.id,
                Some(bookings[1].id.clone()),
                20_000,
                "session cut short".into(),
            )
            .await
            .unwrap();
        let resolved = fx
            .refunds
            .resolve(&Principal::admin("admin"), &req.id, true, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(resolved.request.status, RefundRequestStatus::Approved);
        assert_eq!(resolved.payment.status, PaymentStatus::PartiallyRefunded);
        assert!(resolved.adjustment.is_none());

        let payout = fx
            .settlement
            .confirm_payout(&Principal::admin("admin"), &payment.id, Utc::now(), None)
            .await
            .unwrap();
        assert_eq!(payout.breakdown.sessions, 1);
        assert_eq!(payout.breakdown.net, 40_000);
    }

    #[tokio::test]
    async fn payment_level_approval_reaches_settlement() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(2, 100_000, 0).await;
        let a = fx.slot("th-1", date(2026, 3, 2), 10, 1).await;
        let b = fx.slot("th-1", date(2026, 3, 9), 10, 1).await;
        let bookings = fx.book_confirmed(&payment, &[&a, &b]).await;

        let req = fx
            .refunds
            .submit(&Principal::parent("parent-1"), &payment.id, None, 50_000, "moved".into())
            .await
            .unwrap();
        let resolved = fx
            .refunds
            .resolve(&Principal::admin("admin"), &req.id, true, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(resolved.payment.refunded_amount, 50_000);
        assert!(resolved.adjustment.is_none());

        let first = fx.repos.bookings().find_by_id(&bookings[0].id).await.unwrap().unwrap();
        let second = fx.repos.bookings().find_by_id(&bookings[1].id).await.unwrap().unwrap();
        assert_eq!(first.refund_amount, 50_000);
        assert_eq!(second.refund_amount, 0);

        let therapist = Principal::therapist("th-1");
        for booking in &bookings {
            fx.settlement
                .complete_session(&therapist, &booking.id, None, Utc::now())
                .await
                .unwrap();
        }
        let payout = fx
            .settlement
            .confirm_payout(&Principal::admin("admin"), &payment.id, Utc::now(), None)
            .await
            .unwrap();
        assert_eq!(payout.breakdown.sessions, 1);
        assert_eq!(payout.breakdown.net, 40_000);
    }

    #[tokio::test]
    async fn approval_after_settlement_becomes_ledger_adjustment() {
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

        let req = fx
            .refunds
            .submit(
                &Principal::parent("parent-1"),
                &payment.id,
                Some(booking.id.clone()),
                10_000,
                "late start".into(),
            )
            .await
            .unwrap();
        let resolved = fx
            .refunds
            .resolve(&admin, &req.id, true, Some("goodwill".into()), Utc::now())
            .await
            .unwrap();

        let adjustment = resolved.adjustment.unwrap();
        assert_eq!(adjustment.kind, LedgerEntryKind::RefundAdjustment);
        assert_eq!(adjustment.amount, 8_000);
        // The frozen payout is untouched
        assert_eq!(resolved.payment.settlement_amount, Some(40_000));
        let stored = fx.repos.bookings().find_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::SettlementCompleted);
        assert_eq!(stored.refund_amount, 0);

        assert!(matches!(
            fx.refunds.resolve(&admin, &req.id, false, None, Utc::now()).await,
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn rejection_moves_no_money() {
        let fx = Fixture::new();
        let payment = fx.paid_payment(1, 50_000, 0).await;
        let req = fx
            .refunds
            .submit(&Principal::parent("parent-1"), &payment.id, None, 5_000, "x".into())
            .await
            .unwrap();
        let resolved = fx
            .refunds
            .resolve(&Principal::admin("admin"), &req.id, false, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(resolved.request.status, RefundRequestStatus::Rejected);
        assert_eq!(resolved.payment.refunded_amount, 0);
        assert!(fx
            .refunds
            .list_pending(&Principal::admin("admin"), PaginationParams::default())
            .await
            .unwrap()
            .items
            .is_empty());
    }
}
