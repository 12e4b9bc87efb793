//! Settlement API handlers

use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::Utc;

use super::dto::{
    CompleteSessionRequest, ConfirmPayoutRequest, PayoutConfirmationDto, SessionCompletionDto,
    SettlementBreakdownDto,
};
use crate::application::Principal;
use crate::interfaces::http::common::{domain_error, ok, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::payments::dto::LedgerEntryDto;
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    tag = "Settlements",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = CompleteSessionRequest,
    responses(
        (status = 200, description = "Session completed, awaiting payout", body = ApiResponse<SessionCompletionDto>),
        (status = 403, description = "Not the booking's therapist"),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_session(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CompleteSessionRequest>,
) -> ApiResult<SessionCompletionDto> {
    let completion = state
        .settlement
        .complete_session(&principal, &booking_id, body.note, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(completion.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}/settlement",
    tag = "Settlements",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payout as it stands now", body = ApiResponse<SettlementBreakdownDto>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn preview_settlement(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
) -> ApiResult<SettlementBreakdownDto> {
    let breakdown = state
        .settlement
        .preview(&principal, &payment_id)
        .await
        .map_err(domain_error)?;
    ok(breakdown.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/settlement/confirm",
    tag = "Settlements",
    params(("id" = String, Path, description = "Payment ID")),
    request_body = ConfirmPayoutRequest,
    responses(
        (status = 200, description = "Payout confirmed", body = ApiResponse<PayoutConfirmationDto>),
        (status = 400, description = "Sessions still outstanding"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Already settled")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm_payout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
    ValidatedJson(body): ValidatedJson<ConfirmPayoutRequest>,
) -> ApiResult<PayoutConfirmationDto> {
    let confirmation = state
        .settlement
        .confirm_payout(&principal, &payment_id, Utc::now(), body.note)
        .await
        .map_err(domain_error)?;
    ok(confirmation.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/therapists/{id}/ledger",
    tag = "Settlements",
    params(("id" = String, Path, description = "Therapist ID")),
    responses(
        (status = 200, description = "Penalties, adjustments and deficits", body = ApiResponse<Vec<LedgerEntryDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn therapist_ledger(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(therapist_id): Path<String>,
) -> ApiResult<Vec<LedgerEntryDto>> {
    let entries = state
        .settlement
        .therapist_ledger(&principal, &therapist_id)
        .await
        .map_err(domain_error)?;
    ok(entries.into_iter().map(LedgerEntryDto::from).collect())
}
