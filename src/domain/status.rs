//! Booking and payment status machines
//!
//! Both entities carry a closed status enumeration. Every status write in the
//! application layer goes through [`ensure_booking_transition`] or
//! [`ensure_payment_transition`], which check the transition tables below and
//! the coupling rule between the two machines.

use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingConfirmation,
    Confirmed,
    PendingSettlement,
    SettlementCompleted,
    /// Cancelled by the parent, the therapist after confirmation, or an admin
    Cancelled,
    /// Declined by the therapist before confirmation
    Rejected,
    /// Confirmed session that one party did not attend
    NoShow,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        Self::PendingConfirmation,
        Self::Confirmed,
        Self::PendingSettlement,
        Self::SettlementCompleted,
        Self::Cancelled,
        Self::Rejected,
        Self::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingConfirmation => "PENDING_CONFIRMATION",
            Self::Confirmed => "CONFIRMED",
            Self::PendingSettlement => "PENDING_SETTLEMENT",
            Self::SettlementCompleted => "SETTLEMENT_COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
            Self::NoShow => "NO_SHOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// States from which a side-exit (cancel / reject / no-show) is still possible.
    pub fn is_pre_completion(&self) -> bool {
        matches!(self, Self::PendingConfirmation | Self::Confirmed)
    }

    /// Session took place (or is being paid out).
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::PendingSettlement | Self::SettlementCompleted)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SettlementCompleted | Self::Cancelled | Self::Rejected | Self::NoShow
        )
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (PendingConfirmation, Confirmed)
                | (PendingConfirmation, Cancelled)
                | (PendingConfirmation, Rejected)
                | (Confirmed, PendingSettlement)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (PendingSettlement, SettlementCompleted)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    PendingPayment,
    Paid,
    PartiallyRefunded,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        Self::PendingPayment,
        Self::Paid,
        Self::PartiallyRefunded,
        Self::Refunded,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
            Self::Refunded => "REFUNDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Money has been collected (possibly partly returned since).
    pub fn is_collected(&self) -> bool {
        matches!(self, Self::Paid | Self::PartiallyRefunded | Self::Refunded)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (PendingPayment, Paid)
                | (PendingPayment, Failed)
                | (Paid, PartiallyRefunded)
                | (Paid, Refunded)
                | (PartiallyRefunded, PartiallyRefunded)
                | (PartiallyRefunded, Refunded)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a booking transition against the table and the payment coupling rule.
///
/// A booking may not move forward (confirm, complete, no-show) while its
/// payment has not been collected. Cancellation and rejection stay allowed so
/// an unpaid booking can still release its slot.
pub fn ensure_booking_transition(
    from: BookingStatus,
    to: BookingStatus,
    payment: PaymentStatus,
) -> Result<(), DomainError> {
    if !from.can_transition_to(to) {
        return Err(DomainError::InvalidStateTransition {
            entity: "Booking",
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let forward = matches!(
        to,
        BookingStatus::Confirmed
            | BookingStatus::PendingSettlement
            | BookingStatus::SettlementCompleted
            | BookingStatus::NoShow
    );
    if forward && !payment.is_collected() {
        return Err(DomainError::InvalidStateTransition {
            entity: "Booking",
            from: format!("{} (payment {})", from, payment),
            to: to.to_string(),
        });
    }

    Ok(())
}

pub fn ensure_payment_transition(from: PaymentStatus, to: PaymentStatus) -> Result<(), DomainError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DomainError::InvalidStateTransition {
            entity: "Payment",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Single status shown to the paying party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind", content = "status")]
pub enum DisplayStatus {
    PaymentPending,
    Booking(BookingStatus),
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::Booking(status) => status.as_str(),
        }
    }
}

/// An unpaid payment overrides whatever the booking itself says.
pub fn display_status(booking: BookingStatus, payment: PaymentStatus) -> DisplayStatus {
    if payment == PaymentStatus::PendingPayment {
        DisplayStatus::PaymentPending
    } else {
        DisplayStatus::Booking(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_allowed() {
        let path = [
            BookingStatus::PendingConfirmation,
            BookingStatus::Confirmed,
            BookingStatus::PendingSettlement,
            BookingStatus::SettlementCompleted,
        ];
        for pair in path.windows(2) {
            assert!(ensure_booking_transition(pair[0], pair[1], PaymentStatus::Paid).is_ok());
        }
    }

    #[test]
    fn rejection_only_before_confirmation() {
        assert!(BookingStatus::PendingConfirmation.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Rejected));
    }

    #[test]
    fn no_show_only_after_confirmation() {
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::NoShow));
        assert!(!BookingStatus::PendingConfirmation.can_transition_to(BookingStatus::NoShow));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in BookingStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in BookingStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be forbidden");
            }
        }
    }

    #[test]
    fn cancelling_settled_booking_is_invalid() {
        let err = ensure_booking_transition(
            BookingStatus::SettlementCompleted,
            BookingStatus::Cancelled,
            PaymentStatus::Paid,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { entity: "Booking", .. }));
    }

    #[test]
    fn unpaid_payment_blocks_confirmation_but_not_cancellation() {
        assert!(ensure_booking_transition(
            BookingStatus::PendingConfirmation,
            BookingStatus::Confirmed,
            PaymentStatus::PendingPayment,
        )
        .is_err());
        assert!(ensure_booking_transition(
            BookingStatus::PendingConfirmation,
            BookingStatus::Cancelled,
            PaymentStatus::PendingPayment,
        )
        .is_ok());
    }

    #[test]
    fn payment_table() {
        use PaymentStatus::*;
        assert!(ensure_payment_transition(PendingPayment, Paid).is_ok());
        assert!(ensure_payment_transition(PendingPayment, Failed).is_ok());
        assert!(ensure_payment_transition(Paid, PartiallyRefunded).is_ok());
        assert!(ensure_payment_transition(PartiallyRefunded, Refunded).is_ok());
        assert!(ensure_payment_transition(Failed, Paid).is_err());
        assert!(ensure_payment_transition(Refunded, PartiallyRefunded).is_err());
        assert!(ensure_payment_transition(PendingPayment, Refunded).is_err());
    }

    #[test]
    fn unpaid_payment_overrides_display() {
        assert_eq!(
            display_status(BookingStatus::Confirmed, PaymentStatus::PendingPayment),
            DisplayStatus::PaymentPending
        );
        assert_eq!(
            display_status(BookingStatus::Confirmed, PaymentStatus::Paid).as_str(),
            "CONFIRMED"
        );
    }

    #[test]
    fn status_strings_parse_back() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("PARTIALLY_REFUNDED"), Some(PaymentStatus::PartiallyRefunded));
        assert_eq!(PaymentStatus::parse("paid"), None);
    }
}
