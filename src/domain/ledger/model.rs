//! Ledger entry domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    /// Flat penalty for a late therapist cancellation or no-show
    TherapistPenalty,
    /// Flat credit owed to the parent for the same events
    ParentCompensation,
    /// Refund approved after the session was already paid out
    RefundAdjustment,
    /// Deductions that exceeded a settlement, carried to the next one
    CarriedDeficit,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TherapistPenalty => "THERAPIST_PENALTY",
            Self::ParentCompensation => "PARENT_COMPENSATION",
            Self::RefundAdjustment => "REFUND_ADJUSTMENT",
            Self::CarriedDeficit => "CARRIED_DEFICIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "THERAPIST_PENALTY" => Some(Self::TherapistPenalty),
            "PARENT_COMPENSATION" => Some(Self::ParentCompensation),
            "REFUND_ADJUSTMENT" => Some(Self::RefundAdjustment),
            "CARRIED_DEFICIT" => Some(Self::CarriedDeficit),
            _ => None,
        }
    }

    /// Reduces the therapist's next settlement
    pub fn is_therapist_deduction(&self) -> bool {
        !matches!(self, Self::ParentCompensation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: String,
    pub kind: LedgerEntryKind,
    pub therapist_id: String,
    pub parent_id: String,
    pub payment_id: Option<String>,
    pub booking_id: Option<String>,
    /// Always positive
    pub amount: Money,
    /// Settlement (payment id) that consumed this entry
    pub applied_to: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl LedgerEntry {
    pub fn new(
        kind: LedgerEntryKind,
        therapist_id: impl Into<String>,
        parent_id: impl Into<String>,
        payment_id: Option<String>,
        booking_id: Option<String>,
        amount: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            therapist_id: therapist_id.into(),
            parent_id: parent_id.into(),
            payment_id,
            booking_id,
            amount,
            applied_to: None,
            applied_at: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.applied_to.is_none()
    }

    pub fn apply_to(&mut self, payment_id: impl Into<String>, at: DateTime<Utc>) {
        self.applied_to = Some(payment_id.into());
        self.applied_at = Some(at);
    }
}
