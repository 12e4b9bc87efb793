//! Settlement DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{PayoutConfirmation, SessionCompletion};
use crate::domain::policy::SettlementBreakdown;
use crate::domain::Money;
use crate::interfaces::http::modules::bookings::dto::BookingDto;
use crate::interfaces::http::modules::payments::dto::{LedgerEntryDto, PaymentDto};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettlementBreakdownDto {
    /// Sessions awaiting payout
    pub sessions: usize,
    pub gross: Money,
    pub commission: Money,
    pub deductions: Money,
    pub net: Money,
    pub carried_deficit: Money,
}

impl From<SettlementBreakdown> for SettlementBreakdownDto {
    fn from(b: SettlementBreakdown) -> Self {
        Self {
            sessions: b.sessions,
            gross: b.gross,
            commission: b.commission,
            deductions: b.deductions,
            net: b.net,
            carried_deficit: b.carried_deficit,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CompleteSessionRequest {
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionCompletionDto {
    pub booking: BookingDto,
    pub payment: PaymentDto,
    pub preview: SettlementBreakdownDto,
}

impl From<SessionCompletion> for SessionCompletionDto {
    fn from(c: SessionCompletion) -> Self {
        Self {
            booking: c.booking.into(),
            payment: c.payment.into(),
            preview: c.preview.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ConfirmPayoutRequest {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PayoutConfirmationDto {
    pub payment: PaymentDto,
    pub breakdown: SettlementBreakdownDto,
    pub applied_entries: Vec<LedgerEntryDto>,
    pub carried_deficit: Option<LedgerEntryDto>,
}

impl From<PayoutConfirmation> for PayoutConfirmationDto {
    fn from(p: PayoutConfirmation) -> Self {
        Self {
            payment: p.payment.into(),
            breakdown: p.breakdown.into(),
            applied_entries: p.applied_entries.into_iter().map(LedgerEntryDto::from).collect(),
            carried_deficit: p.carried_deficit.map(LedgerEntryDto::from),
        }
    }
}
