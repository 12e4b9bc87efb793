//! Refund request DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::RefundResolution;
use crate::domain::{Money, RefundRequest};
use crate::interfaces::http::modules::payments::dto::{LedgerEntryDto, PaymentDto};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefundRequestDto {
    pub id: String,
    pub payment_id: String,
    pub booking_id: Option<String>,
    pub parent_id: String,
    pub requested_amount: Money,
    pub reason: String,
    /// PENDING | APPROVED | REJECTED
    pub status: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RefundRequest> for RefundRequestDto {
    fn from(r: RefundRequest) -> Self {
        Self {
            status: r.status.as_str().to_string(),
            id: r.id,
            payment_id: r.payment_id,
            booking_id: r.booking_id,
            parent_id: r.parent_id,
            requested_amount: r.requested_amount,
            reason: r.reason,
            resolved_by: r.resolved_by,
            resolved_at: r.resolved_at,
            resolution_note: r.resolution_note,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitRefundRequest {
    pub booking_id: Option<String>,
    #[validate(range(min = 1))]
    pub amount: Money,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveRefundRequest {
    pub approve: bool,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefundResolutionDto {
    pub request: RefundRequestDto,
    pub payment: PaymentDto,
    /// Present when the refund reversed an already-settled payout
    pub adjustment: Option<LedgerEntryDto>,
}

impl From<RefundResolution> for RefundResolutionDto {
    fn from(r: RefundResolution) -> Self {
        Self {
            request: r.request.into(),
            payment: r.payment.into(),
            adjustment: r.adjustment.map(LedgerEntryDto::from),
        }
    }
}
