//! Payment DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{
    LedgerEntry, Money, NewPayment, PackageSummary, Payment, PaymentFilter, PaymentStatus,
    SessionType,
};
use crate::interfaces::http::common::{bad_request, parse_csv, ApiError};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentDto {
    pub id: String,
    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,
    /// CONSULTATION | THERAPY
    pub session_type: String,
    pub total_sessions: i32,
    pub original_fee: Money,
    pub discount_rate: i32,
    pub final_fee: Money,
    pub refunded_amount: Money,
    pub refundable: Money,
    pub status: String,
    pub completed_sessions: i32,
    pub paid_at: Option<DateTime<Utc>>,
    pub settlement_amount: Option<Money>,
    pub settled_at: Option<DateTime<Utc>>,
    pub settlement_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            refundable: p.refundable(),
            session_type: p.session_type.as_str().to_string(),
            status: p.status.as_str().to_string(),
            id: p.id,
            parent_id: p.parent_id,
            therapist_id: p.therapist_id,
            child_id: p.child_id,
            total_sessions: p.total_sessions,
            original_fee: p.original_fee,
            discount_rate: p.discount_rate,
            final_fee: p.final_fee,
            refunded_amount: p.refunded_amount,
            completed_sessions: p.completed_sessions,
            paid_at: p.paid_at,
            settlement_amount: p.settlement_amount,
            settled_at: p.settled_at,
            settlement_note: p.settlement_note,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1))]
    pub parent_id: String,
    #[validate(length(min = 1))]
    pub therapist_id: String,
    #[validate(length(min = 1))]
    pub child_id: String,
    #[schema(example = "THERAPY")]
    pub session_type: String,
    #[validate(range(min = 1, max = 100))]
    pub total_sessions: i32,
    #[validate(range(min = 0))]
    pub original_fee: Money,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub discount_rate: i32,
}

pub fn parse_session_type(raw: &str) -> Result<SessionType, ApiError> {
    SessionType::parse(&raw.to_ascii_uppercase())
        .ok_or_else(|| bad_request(format!("unknown session type '{}'", raw)))
}

impl CreatePaymentRequest {
    pub fn into_domain(self) -> Result<NewPayment, ApiError> {
        Ok(NewPayment {
            session_type: parse_session_type(&self.session_type)?,
            parent_id: self.parent_id,
            therapist_id: self.therapist_id,
            child_id: self.child_id,
            total_sessions: self.total_sessions,
            original_fee: self.original_fee,
            discount_rate: self.discount_rate,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyRefundRequest {
    #[validate(range(min = 1))]
    pub amount: Money,
}

/// Listing filters. `status` takes a comma-separated list.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PaymentListQuery {
    pub status: Option<String>,
    pub session_type: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl PaymentListQuery {
    pub fn into_filter(self) -> Result<PaymentFilter, ApiError> {
        let statuses = parse_csv(self.status.as_deref(), "status", |s| {
            PaymentStatus::parse(&s.to_ascii_uppercase())
        })?;
        let session_type = self
            .session_type
            .as_deref()
            .map(parse_session_type)
            .transpose()?;
        Ok(PaymentFilter {
            statuses,
            session_type,
            created_from: self.created_from,
            created_to: self.created_to,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageSummaryDto {
    pub group_key: String,
    pub session_type: String,
    pub payment_status: String,
    pub total_fee: Money,
    pub total_sessions: i32,
    pub completed_sessions: i32,
}

impl From<PackageSummary> for PackageSummaryDto {
    fn from(s: PackageSummary) -> Self {
        Self {
            session_type: s.session_type.as_str().to_string(),
            payment_status: s.payment_status.as_str().to_string(),
            group_key: s.group_key,
            total_fee: s.total_fee,
            total_sessions: s.total_sessions,
            completed_sessions: s.completed_sessions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntryDto {
    pub id: String,
    /// THERAPIST_PENALTY | PARENT_COMPENSATION | REFUND_ADJUSTMENT | CARRIED_DEFICIT
    pub kind: String,
    pub therapist_id: String,
    pub parent_id: String,
    pub payment_id: Option<String>,
    pub booking_id: Option<String>,
    pub amount: Money,
    pub applied_to: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryDto {
    fn from(e: LedgerEntry) -> Self {
        Self {
            kind: e.kind.as_str().to_string(),
            id: e.id,
            therapist_id: e.therapist_id,
            parent_id: e.parent_id,
            payment_id: e.payment_id,
            booking_id: e.booking_id,
            amount: e.amount,
            applied_to: e.applied_to,
            applied_at: e.applied_at,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_parses_status_list() {
        let filter = PaymentListQuery {
            status: Some("paid, partially_refunded".into()),
            session_type: Some("therapy".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(
            filter.statuses,
            vec![PaymentStatus::Paid, PaymentStatus::PartiallyRefunded]
        );
        assert_eq!(filter.session_type, Some(SessionType::Therapy));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = PaymentListQuery {
            status: Some("PAID,LOST".into()),
            ..Default::default()
        }
        .into_filter();
        assert!(result.is_err());
    }
}
