//! Payment domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::status::{ensure_payment_transition, PaymentStatus};
use crate::shared::errors::DomainError;

/// Whole currency units
pub type Money = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Consultation,
    Therapy,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "CONSULTATION",
            Self::Therapy => "THERAPY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONSULTATION" => Some(Self::Consultation),
            "THERAPY" => Some(Self::Therapy),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase request before fees are derived
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,
    pub session_type: SessionType,
    pub total_sessions: i32,
    pub original_fee: Money,
    /// Percent, 0..=100
    pub discount_rate: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: String,
    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,
    pub session_type: SessionType,
    pub total_sessions: i32,
    pub original_fee: Money,
    pub discount_rate: i32,
    pub final_fee: Money,
    pub refunded_amount: Money,
    pub status: PaymentStatus,
    pub completed_sessions: i32,
    pub paid_at: Option<DateTime<Utc>>,
    pub settlement_amount: Option<Money>,
    pub settled_at: Option<DateTime<Utc>>,
    pub settlement_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl Payment {
    pub fn new(input: NewPayment) -> Result<Self, DomainError> {
        if input.total_sessions < 1 {
            return Err(DomainError::Validation(
                "total_sessions must be at least 1".into(),
            ));
        }
        if input.original_fee < 0 {
            return Err(DomainError::Validation("original_fee must not be negative".into()));
        }
        if !(0..=100).contains(&input.discount_rate) {
            return Err(DomainError::Validation(
                "discount_rate must be within 0..=100".into(),
            ));
        }

        let final_fee = input.original_fee * (100 - input.discount_rate as i64) / 100;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            parent_id: input.parent_id,
            therapist_id: input.therapist_id,
            child_id: input.child_id,
            session_type: input.session_type,
            total_sessions: input.total_sessions,
            original_fee: input.original_fee,
            discount_rate: input.discount_rate,
            final_fee,
            refunded_amount: 0,
            status: PaymentStatus::PendingPayment,
            completed_sessions: 0,
            paid_at: None,
            settlement_amount: None,
            settled_at: None,
            settlement_note: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Bookings of this payment share its id as their group key.
    pub fn group_key(&self) -> &str {
        &self.id
    }

    /// Standard non-discounted price of one session.
    pub fn unit_price(&self) -> Money {
        self.original_fee / self.total_sessions.max(1) as Money
    }

    /// Per-session fee shares summing exactly to `final_fee`.
    /// The truncation remainder goes one unit at a time to the earliest sessions.
    pub fn fee_shares(&self) -> Vec<Money> {
        let n = self.total_sessions.max(1) as Money;
        let base = self.final_fee / n;
        let remainder = self.final_fee % n;
        (0..n).map(|i| base + Money::from(i < remainder)).collect()
    }

    pub fn refundable(&self) -> Money {
        if self.status.is_collected() {
            (self.final_fee - self.refunded_amount).max(0)
        } else {
            0
        }
    }

    pub fn is_unpaid(&self) -> bool {
        !self.status.is_collected()
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        ensure_payment_transition(self.status, PaymentStatus::Paid)?;
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(at);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_failed(&mut self) -> Result<(), DomainError> {
        ensure_payment_transition(self.status, PaymentStatus::Failed)?;
        self.status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record money returned to the parent. A zero amount is a no-op.
    pub fn apply_refund(&mut self, amount: Money) -> Result<(), DomainError> {
        if amount == 0 {
            return Ok(());
        }
        if amount < 0 || amount > self.refundable() {
            return Err(DomainError::Validation(format!(
                "refund {} outside [1, {}]",
                amount,
                self.refundable()
            )));
        }

        let refunded = self.refunded_amount + amount;
        let next = if refunded >= self.final_fee {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        ensure_payment_transition(self.status, next)?;
        self.refunded_amount = refunded;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Filter for payment listings
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub statuses: Vec<PaymentStatus>,
    pub session_type: Option<SessionType>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl PaymentFilter {
    pub fn matches(&self, p: &Payment) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&p.status))
            && self.session_type.map_or(true, |t| t == p.session_type)
            && self.created_from.map_or(true, |from| p.created_at >= from)
            && self.created_to.map_or(true, |to| p.created_at <= to)
    }
}

/// Group-by-package view over one payment's bookings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub group_key: String,
    pub session_type: SessionType,
    pub payment_status: PaymentStatus,
    pub total_fee: Money,
    pub total_sessions: i32,
    pub completed_sessions: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(original_fee: Money, sessions: i32, discount: i32) -> Payment {
        Payment::new(NewPayment {
            parent_id: "parent-1".into(),
            therapist_id: "th-1".into(),
            child_id: "child-1".into(),
            session_type: SessionType::Therapy,
            total_sessions: sessions,
            original_fee,
            discount_rate: discount,
        })
        .unwrap()
    }

    #[test]
    fn final_fee_applies_discount_with_truncation() {
        let p = package(300_000, 3, 30);
        assert_eq!(p.final_fee, 210_000);
        assert_eq!(p.unit_price(), 100_000);
        assert_eq!(p.status, PaymentStatus::PendingPayment);
        assert_eq!(p.group_key(), p.id);

        assert_eq!(package(99_999, 1, 15).final_fee, 84_999);
    }

    #[test]
    fn fee_shares_sum_to_final_fee() {
        assert_eq!(package(300_000, 3, 30).fee_shares(), vec![70_000; 3]);

        let odd = package(100_000, 3, 0);
        let shares = odd.fee_shares();
        assert_eq!(shares, vec![33_334, 33_333, 33_333]);
        assert_eq!(shares.iter().sum::<Money>(), odd.final_fee);
    }

    #[test]
    fn rejects_invalid_input() {
        let base = NewPayment {
            parent_id: "p".into(),
            therapist_id: "t".into(),
            child_id: "c".into(),
            session_type: SessionType::Consultation,
            total_sessions: 0,
            original_fee: 1000,
            discount_rate: 0,
        };
        assert!(Payment::new(base.clone()).is_err());
        assert!(Payment::new(NewPayment { total_sessions: 1, discount_rate: 101, ..base.clone() }).is_err());
        assert!(Payment::new(NewPayment { total_sessions: 1, original_fee: -1, ..base }).is_err());
    }

    #[test]
    fn refunds_move_through_partial_to_full() {
        let mut p = package(300_000, 3, 30);
        assert!(p.apply_refund(10).is_err(), "unpaid payment has nothing to refund");

        p.mark_paid(Utc::now()).unwrap();
        p.apply_refund(70_000).unwrap();
        assert_eq!(p.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(p.refundable(), 140_000);

        assert!(p.apply_refund(140_001).is_err());
        p.apply_refund(140_000).unwrap();
        assert_eq!(p.status, PaymentStatus::Refunded);
        assert_eq!(p.refundable(), 0);
    }

    #[test]
    fn failed_payment_cannot_be_paid() {
        let mut p = package(50_000, 1, 0);
        p.mark_failed().unwrap();
        assert!(matches!(
            p.mark_paid(Utc::now()),
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }
}
