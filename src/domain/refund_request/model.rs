//! Refund request domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RefundRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for RefundRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refund asked for by the paying party, resolved by an administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub id: String,
    pub payment_id: String,
    pub booking_id: Option<String>,
    pub parent_id: String,
    pub requested_amount: Money,
    pub reason: String,
    pub status: RefundRequestStatus,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl RefundRequest {
    pub fn new(
        payment_id: impl Into<String>,
        booking_id: Option<String>,
        parent_id: impl Into<String>,
        requested_amount: Money,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payment_id: payment_id.into(),
            booking_id,
            parent_id: parent_id.into(),
            requested_amount,
            reason: reason.into(),
            status: RefundRequestStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            resolution_note: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RefundRequestStatus::Pending
    }

    pub fn resolve(
        &mut self,
        approve: bool,
        resolved_by: impl Into<String>,
        at: DateTime<Utc>,
        note: Option<String>,
    ) {
        self.status = if approve {
            RefundRequestStatus::Approved
        } else {
            RefundRequestStatus::Rejected
        };
        self.resolved_by = Some(resolved_by.into());
        self.resolved_at = Some(at);
        self.resolution_note = note;
    }
}
