//! Payment API handlers

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::Utc;

use super::dto::{
    ApplyRefundRequest, CreatePaymentRequest, LedgerEntryDto, PackageSummaryDto, PaymentDto,
    PaymentListQuery,
};
use crate::application::Principal;
use crate::interfaces::http::common::{
    domain_error, ok, ApiResponse, ApiResult, PaginatedResponse, PaginationParams, ValidatedJson,
};
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "Payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Payment created in PENDING_PAYMENT", body = ApiResponse<PaymentDto>),
        (status = 400, description = "Invalid fee, discount or session count"),
        (status = 404, description = "Unknown therapist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(body): ValidatedJson<CreatePaymentRequest>,
) -> ApiResult<PaymentDto> {
    let input = body.into_domain()?;
    let payment = state
        .payments
        .create_payment(&principal, input)
        .await
        .map_err(domain_error)?;
    ok(payment.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "Payments",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = ApiResponse<PaymentDto>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
) -> ApiResult<PaymentDto> {
    let payment = state
        .payments
        .get(&principal, &payment_id)
        .await
        .map_err(domain_error)?;
    ok(payment.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/paid",
    tag = "Payments",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment collected", body = ApiResponse<PaymentDto>),
        (status = 409, description = "Not pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_payment_paid(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
) -> ApiResult<PaymentDto> {
    let payment = state
        .payments
        .mark_paid(&principal, &payment_id, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(payment.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/failed",
    tag = "Payments",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment failed", body = ApiResponse<PaymentDto>),
        (status = 409, description = "Not pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_payment_failed(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
) -> ApiResult<PaymentDto> {
    let payment = state
        .payments
        .mark_failed(&principal, &payment_id)
        .await
        .map_err(domain_error)?;
    ok(payment.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refunds",
    tag = "Payments",
    params(("id" = String, Path, description = "Payment ID")),
    request_body = ApplyRefundRequest,
    responses(
        (status = 200, description = "Refund recorded", body = ApiResponse<PaymentDto>),
        (status = 400, description = "Amount exceeds refundable"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn apply_refund(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
    ValidatedJson(body): ValidatedJson<ApplyRefundRequest>,
) -> ApiResult<PaymentDto> {
    let payment = state
        .payments
        .apply_refund(&principal, &payment_id, body.amount)
        .await
        .map_err(domain_error)?;
    ok(payment.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/parents/{id}/payments",
    tag = "Payments",
    params(("id" = String, Path, description = "Parent ID"), PaymentListQuery, PaginationParams),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<PaginatedResponse<PaymentDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_parent_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(parent_id): Path<String>,
    Query(query): Query<PaymentListQuery>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<PaymentDto>> {
    let filter = query.into_filter()?;
    let result = state
        .payments
        .list_for_parent(&principal, &parent_id, &filter, page.into())
        .await
        .map_err(domain_error)?;
    ok(PaginatedResponse::from_result(result, PaymentDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/parents/{id}/packages",
    tag = "Payments",
    params(("id" = String, Path, description = "Parent ID"), PaymentListQuery, PaginationParams),
    responses(
        (status = 200, description = "One summary per purchased package", body = ApiResponse<PaginatedResponse<PackageSummaryDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_parent_packages(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(parent_id): Path<String>,
    Query(query): Query<PaymentListQuery>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<PackageSummaryDto>> {
    let filter = query.into_filter()?;
    let result = state
        .payments
        .package_summaries(&principal, &parent_id, &filter, page.into())
        .await
        .map_err(domain_error)?;
    ok(PaginatedResponse::from_result(result, PackageSummaryDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/parents/{id}/credits",
    tag = "Payments",
    params(("id" = String, Path, description = "Parent ID")),
    responses(
        (status = 200, description = "Compensation credits owed to the parent", body = ApiResponse<Vec<LedgerEntryDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_parent_credits(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(parent_id): Path<String>,
) -> ApiResult<Vec<LedgerEntryDto>> {
    let entries = state
        .payments
        .parent_credits(&principal, &parent_id)
        .await
        .map_err(domain_error)?;
    ok(entries.into_iter().map(LedgerEntryDto::from).collect())
}
