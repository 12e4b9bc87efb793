//! Booking domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::{Money, Payment, SessionType};
use crate::domain::slot::TimeSlot;
use crate::domain::status::BookingStatus;

/// Party that triggered a cancellation, rejection or no-show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Initiator {
    Parent,
    Therapist,
    Admin,
}

impl Initiator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Therapist => "THERAPIST",
            Self::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PARENT" => Some(Self::Parent),
            "THERAPIST" => Some(Self::Therapist),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Initiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled session, bound to one reserved slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: String,
    pub payment_id: String,
    /// Always the owning payment's id
    pub group_key: String,
    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,
    pub slot_id: String,
    /// 1..=N, unique within the group
    pub session_number: i32,
    pub scheduled_at: DateTime<Utc>,
    pub fee_share: Money,
    pub status: BookingStatus,
    pub refund_amount: Money,
    pub therapist_note: Option<String>,
    pub cancelled_by: Option<Initiator>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl Booking {
    pub fn for_slot(payment: &Payment, slot: &TimeSlot, session_number: i32, fee_share: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            payment_id: payment.id.clone(),
            group_key: payment.group_key().to_string(),
            parent_id: payment.parent_id.clone(),
            therapist_id: payment.therapist_id.clone(),
            child_id: payment.child_id.clone(),
            slot_id: slot.id.clone(),
            session_number,
            scheduled_at: slot.starts_at(),
            fee_share,
            status: BookingStatus::PendingConfirmation,
            refund_amount: 0,
            therapist_note: None,
            cancelled_by: None,
            cancelled_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Fee still collectable for this session after refunds.
    pub fn collected_fee(&self) -> Money {
        (self.fee_share - self.refund_amount).max(0)
    }

    /// Completed and nothing refunded against it.
    pub fn is_settleable(&self) -> bool {
        self.status.is_completed() && self.refund_amount == 0
    }

    pub fn holds_slot(&self) -> bool {
        self.status.is_pre_completion()
    }
}

/// Listing filter shared by the parent and therapist views
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub statuses: Vec<BookingStatus>,
    pub session_type: Option<SessionType>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

impl BookingFilter {
    /// Matches every dimension except `session_type`, which lives on the payment.
    pub fn matches_booking(&self, b: &Booking) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&b.status))
            && self.scheduled_from.map_or(true, |from| b.scheduled_at >= from)
            && self.scheduled_to.map_or(true, |to| b.scheduled_at <= to)
    }
}
