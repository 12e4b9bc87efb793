//! Booking DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{BookingView, CancellationOutcome, PackageCancellation};
use crate::domain::{Booking, BookingFilter, BookingStatus, Initiator, Money, RefundOutcome};
use crate::interfaces::http::common::{bad_request, parse_csv, ApiError};
use crate::interfaces::http::modules::payments::dto::{
    parse_session_type, LedgerEntryDto, PaymentDto,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDto {
    pub id: String,
    pub payment_id: String,
    pub group_key: String,
    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,
    pub slot_id: String,
    pub session_number: i32,
    pub scheduled_at: DateTime<Utc>,
    pub fee_share: Money,
    /// Stored lifecycle status
    pub status: String,
    /// PAYMENT_PENDING while the payment is uncollected, otherwise `status`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_status: Option<String>,
    pub refund_amount: Money,
    pub therapist_note: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            status: b.status.as_str().to_string(),
            display_status: None,
            cancelled_by: b.cancelled_by.map(|i| i.as_str().to_string()),
            id: b.id,
            payment_id: b.payment_id,
            group_key: b.group_key,
            parent_id: b.parent_id,
            therapist_id: b.therapist_id,
            child_id: b.child_id,
            slot_id: b.slot_id,
            session_number: b.session_number,
            scheduled_at: b.scheduled_at,
            fee_share: b.fee_share,
            refund_amount: b.refund_amount,
            therapist_note: b.therapist_note,
            cancelled_at: b.cancelled_at,
            completed_at: b.completed_at,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

impl From<BookingView> for BookingDto {
    fn from(view: BookingView) -> Self {
        let display = view.display_status.as_str().to_string();
        let mut dto = BookingDto::from(view.booking);
        dto.display_status = Some(display);
        dto
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingsRequest {
    /// One slot per purchased session
    #[validate(length(min = 1, max = 100))]
    pub slot_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NoShowRequest {
    /// Party that did not attend: PARENT or THERAPIST
    #[schema(example = "PARENT")]
    pub absent: String,
}

impl NoShowRequest {
    pub fn absent(&self) -> Result<Initiator, ApiError> {
        Initiator::parse(&self.absent.to_ascii_uppercase())
            .ok_or_else(|| bad_request(format!("unknown party '{}'", self.absent)))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefundOutcomeDto {
    pub tier: String,
    pub basis: Money,
    pub refund_percent: i64,
    pub refund_amount: Money,
    pub withheld_amount: Money,
    pub parent_compensation: Money,
    pub therapist_penalty: Money,
}

impl From<RefundOutcome> for RefundOutcomeDto {
    fn from(r: RefundOutcome) -> Self {
        Self {
            tier: r.tier.as_str().to_string(),
            basis: r.basis,
            refund_percent: r.refund_percent,
            refund_amount: r.refund_amount,
            withheld_amount: r.withheld_amount,
            parent_compensation: r.parent_compensation,
            therapist_penalty: r.therapist_penalty,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancellationDto {
    pub booking: BookingDto,
    pub payment: PaymentDto,
    pub refund: RefundOutcomeDto,
    pub ledger_entries: Vec<LedgerEntryDto>,
}

impl From<CancellationOutcome> for CancellationDto {
    fn from(o: CancellationOutcome) -> Self {
        Self {
            booking: o.booking.into(),
            payment: o.payment.into(),
            refund: o.refund.into(),
            ledger_entries: o.ledger_entries.into_iter().map(LedgerEntryDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionRefundDto {
    pub booking_id: String,
    pub refund: RefundOutcomeDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageCancellationDto {
    pub payment_id: String,
    pub used_sessions: i64,
    pub refund: RefundOutcomeDto,
    /// Confirmed sessions inside the notice window, refunded on their time tier
    pub session_refunds: Vec<SessionRefundDto>,
    pub total_refund: Money,
    pub cancelled_booking_ids: Vec<String>,
}

impl From<PackageCancellation> for PackageCancellationDto {
    fn from(p: PackageCancellation) -> Self {
        Self {
            payment_id: p.payment_id,
            used_sessions: p.used_sessions,
            refund: p.refund.into(),
            session_refunds: p
                .session_refunds
                .into_iter()
                .map(|r| SessionRefundDto {
                    booking_id: r.booking_id,
                    refund: r.refund.into(),
                })
                .collect(),
            total_refund: p.total_refund,
            cancelled_booking_ids: p.cancelled_booking_ids,
        }
    }
}

/// Listing filters. `status` takes a comma-separated list.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub session_type: Option<String>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

impl BookingListQuery {
    pub fn into_filter(self) -> Result<BookingFilter, ApiError> {
        let statuses = parse_csv(self.status.as_deref(), "status", |s| {
            BookingStatus::parse(&s.to_ascii_uppercase())
        })?;
        let session_type = self
            .session_type
            .as_deref()
            .map(parse_session_type)
            .transpose()?;
        Ok(BookingFilter {
            statuses,
            session_type,
            scheduled_from: self.scheduled_from,
            scheduled_to: self.scheduled_to,
        })
    }
}

/// Booking count keyed by status name
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusCountsDto {
    pub counts: BTreeMap<String, u64>,
}

impl From<BTreeMap<BookingStatus, u64>> for StatusCountsDto {
    fn from(counts: BTreeMap<BookingStatus, u64>) -> Self {
        Self {
            counts: counts
                .into_iter()
                .map(|(status, n)| (status.as_str().to_string(), n))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_show_party_is_case_insensitive() {
        let body = NoShowRequest { absent: "therapist".into() };
        assert_eq!(body.absent().unwrap(), Initiator::Therapist);
        assert!(NoShowRequest { absent: "nobody".into() }.absent().is_err());
    }

    #[test]
    fn status_counts_use_wire_names() {
        let counts: BTreeMap<BookingStatus, u64> =
            [(BookingStatus::Confirmed, 2), (BookingStatus::NoShow, 0)].into_iter().collect();
        let dto = StatusCountsDto::from(counts);
        assert_eq!(dto.counts.get("CONFIRMED"), Some(&2));
        assert_eq!(dto.counts.get("NO_SHOW"), Some(&0));
    }

    #[test]
    fn list_query_accepts_several_statuses() {
        let filter = BookingListQuery {
            status: Some("CONFIRMED,pending_confirmation".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(
            filter.statuses,
            vec![BookingStatus::Confirmed, BookingStatus::PendingConfirmation]
        );
    }
}
