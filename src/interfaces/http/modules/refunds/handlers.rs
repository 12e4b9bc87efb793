//! Refund request API handlers

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::Utc;

use super::dto::{RefundRequestDto, RefundResolutionDto, ResolveRefundRequest, SubmitRefundRequest};
use crate::application::Principal;
use crate::interfaces::http::common::{
    domain_error, ok, ApiResponse, ApiResult, PaginatedResponse, PaginationParams, ValidatedJson,
};
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refund-requests",
    tag = "Refunds",
    params(("id" = String, Path, description = "Payment ID")),
    request_body = SubmitRefundRequest,
    responses(
        (status = 200, description = "Request filed", body = ApiResponse<RefundRequestDto>),
        (status = 400, description = "Amount exceeds refundable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_refund_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
    ValidatedJson(body): ValidatedJson<SubmitRefundRequest>,
) -> ApiResult<RefundRequestDto> {
    let request = state
        .refunds
        .submit(&principal, &payment_id, body.booking_id, body.amount, body.reason)
        .await
        .map_err(domain_error)?;
    ok(request.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}/refund-requests",
    tag = "Refunds",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Requests filed against the payment", body = ApiResponse<Vec<RefundRequestDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_payment_refund_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
) -> ApiResult<Vec<RefundRequestDto>> {
    let requests = state
        .refunds
        .list_for_payment(&principal, &payment_id)
        .await
        .map_err(domain_error)?;
    ok(requests.into_iter().map(RefundRequestDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/refund-requests/pending",
    tag = "Refunds",
    params(PaginationParams),
    responses(
        (status = 200, description = "Oldest pending requests first", body = ApiResponse<PaginatedResponse<RefundRequestDto>>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_pending_refund_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<RefundRequestDto>> {
    let result = state
        .refunds
        .list_pending(&principal, page.into())
        .await
        .map_err(domain_error)?;
    ok(PaginatedResponse::from_result(result, RefundRequestDto::from))
}

#[utoipa::path(
    post,
    path = "/api/v1/refund-requests/{id}/resolve",
    tag = "Refunds",
    params(("id" = String, Path, description = "Refund request ID")),
    request_body = ResolveRefundRequest,
    responses(
        (status = 200, description = "Request approved or rejected", body = ApiResponse<RefundResolutionDto>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Already resolved")
    ),
    security(("bearer_auth" = []))
)]
pub async fn resolve_refund_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<String>,
    ValidatedJson(body): ValidatedJson<ResolveRefundRequest>,
) -> ApiResult<RefundResolutionDto> {
    let resolution = state
        .refunds
        .resolve(&principal, &request_id, body.approve, body.note, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(resolution.into())
}
