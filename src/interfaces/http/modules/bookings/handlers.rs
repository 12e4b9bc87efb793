//! Booking API handlers

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::Utc;

use super::dto::{
    BookingDto, BookingListQuery, CancellationDto, CreateBookingsRequest, NoShowRequest,
    PackageCancellationDto, StatusCountsDto,
};
use crate::application::Principal;
use crate::interfaces::http::common::{
    domain_error, ok, ApiResponse, ApiResult, PaginatedResponse, PaginationParams, ValidatedJson,
};
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/bookings",
    tag = "Bookings",
    params(("id" = String, Path, description = "Payment ID")),
    request_body = CreateBookingsRequest,
    responses(
        (status = 200, description = "Booking group created", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Slot count does not match the package"),
        (status = 409, description = "A slot was taken; nothing was reserved")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateBookingsRequest>,
) -> ApiResult<Vec<BookingDto>> {
    let bookings = state
        .bookings
        .create_booking_group(&principal, &payment_id, &body.slot_ids)
        .await
        .map_err(domain_error)?;
    ok(bookings.into_iter().map(BookingDto::from).collect())
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/cancel",
    tag = "Bookings",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Remaining sessions cancelled", body = ApiResponse<PackageCancellationDto>),
        (status = 409, description = "Nothing left to cancel")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_package(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<String>,
) -> ApiResult<PackageCancellationDto> {
    let outcome = state
        .bookings
        .cancel_package(&principal, &payment_id, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(outcome.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking with display status", body = ApiResponse<BookingDto>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<String>,
) -> ApiResult<BookingDto> {
    let view = state
        .bookings
        .get(&principal, &booking_id)
        .await
        .map_err(domain_error)?;
    ok(view.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/confirm",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking confirmed", body = ApiResponse<BookingDto>),
        (status = 409, description = "Not pending confirmation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<String>,
) -> ApiResult<BookingDto> {
    let booking = state
        .bookings
        .confirm(&principal, &booking_id)
        .await
        .map_err(domain_error)?;
    ok(booking.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled or rejected", body = ApiResponse<CancellationDto>),
        (status = 409, description = "Booking is terminal")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<String>,
) -> ApiResult<CancellationDto> {
    let outcome = state
        .bookings
        .cancel(&principal, &booking_id, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(outcome.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/no-show",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = NoShowRequest,
    responses(
        (status = 200, description = "No-show recorded", body = ApiResponse<CancellationDto>),
        (status = 400, description = "Session has not started"),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn report_no_show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<String>,
    ValidatedJson(body): ValidatedJson<NoShowRequest>,
) -> ApiResult<CancellationDto> {
    let absent = body.absent()?;
    let outcome = state
        .bookings
        .record_no_show(&principal, &booking_id, absent, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(outcome.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/parents/{id}/bookings",
    tag = "Bookings",
    params(("id" = String, Path, description = "Parent ID"), BookingListQuery, PaginationParams),
    responses(
        (status = 200, description = "Bookings by schedule", body = ApiResponse<PaginatedResponse<BookingDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_parent_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(parent_id): Path<String>,
    Query(query): Query<BookingListQuery>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<BookingDto>> {
    let filter = query.into_filter()?;
    let result = state
        .bookings
        .list_for_parent(&principal, &parent_id, &filter, page.into())
        .await
        .map_err(domain_error)?;
    ok(PaginatedResponse::from_result(result, BookingDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/therapists/{id}/bookings",
    tag = "Bookings",
    params(("id" = String, Path, description = "Therapist ID"), BookingListQuery, PaginationParams),
    responses(
        (status = 200, description = "Bookings by schedule", body = ApiResponse<PaginatedResponse<BookingDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_therapist_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(therapist_id): Path<String>,
    Query(query): Query<BookingListQuery>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<BookingDto>> {
    let filter = query.into_filter()?;
    let result = state
        .bookings
        .list_for_therapist(&principal, &therapist_id, &filter, page.into())
        .await
        .map_err(domain_error)?;
    ok(PaginatedResponse::from_result(result, BookingDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/therapists/{id}/booking-counts",
    tag = "Bookings",
    params(("id" = String, Path, description = "Therapist ID")),
    responses(
        (status = 200, description = "Count per status", body = ApiResponse<StatusCountsDto>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn therapist_booking_counts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(therapist_id): Path<String>,
) -> ApiResult<StatusCountsDto> {
    let counts = state
        .bookings
        .therapist_status_counts(&principal, &therapist_id)
        .await
        .map_err(domain_error)?;
    ok(counts.into())
}
