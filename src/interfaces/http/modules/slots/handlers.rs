//! Slot API handlers

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use super::dto::{
    CreateHolidayRequest, DateRangeQuery, GenerateSlotsRequest, GenerationReportDto, HolidayDto,
    SlotDto, UpdateSlotFlagsRequest,
};
use crate::application::Principal;
use crate::interfaces::http::common::{domain_error, ok, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/slots/generate",
    tag = "Slots",
    request_body = GenerateSlotsRequest,
    responses(
        (status = 200, description = "Slots generated", body = ApiResponse<GenerationReportDto>),
        (status = 400, description = "Invalid pattern or range"),
        (status = 403, description = "Not the therapist"),
        (status = 404, description = "Unknown therapist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_slots(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(body): ValidatedJson<GenerateSlotsRequest>,
) -> ApiResult<GenerationReportDto> {
    let request = body.into_domain()?;
    let report = state
        .slots
        .generate_pattern(&principal, request)
        .await
        .map_err(domain_error)?;
    ok(report.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/therapists/{id}/slots",
    tag = "Slots",
    params(("id" = String, Path, description = "Therapist ID"), DateRangeQuery),
    responses(
        (status = 200, description = "All slots in range", body = ApiResponse<Vec<SlotDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_therapist_slots(
    State(state): State<AppState>,
    Path(therapist_id): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Vec<SlotDto>> {
    let slots = state
        .slots
        .list_slots(&therapist_id, range.from, range.to)
        .await
        .map_err(domain_error)?;
    ok(slots.into_iter().map(SlotDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    params(("id" = String, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot", body = ApiResponse<SlotDto>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> ApiResult<SlotDto> {
    let slot = state.slots.get(&slot_id).await.map_err(domain_error)?;
    ok(slot.into())
}

#[utoipa::path(
    patch,
    path = "/api/v1/slots/{id}/flags",
    tag = "Slots",
    params(("id" = String, Path, description = "Slot ID")),
    request_body = UpdateSlotFlagsRequest,
    responses(
        (status = 200, description = "Flags updated", body = ApiResponse<SlotDto>),
        (status = 403, description = "Not the slot's therapist"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_slot_flags(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(slot_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateSlotFlagsRequest>,
) -> ApiResult<SlotDto> {
    let slot = state
        .slots
        .update_flags(&principal, &slot_id, body.into())
        .await
        .map_err(domain_error)?;
    ok(slot.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/holidays",
    tag = "Slots",
    request_body = CreateHolidayRequest,
    responses(
        (status = 200, description = "Holiday recorded", body = ApiResponse<HolidayDto>),
        (status = 403, description = "Global holidays are admin-only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_holiday(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(body): ValidatedJson<CreateHolidayRequest>,
) -> ApiResult<HolidayDto> {
    let holiday = state
        .slots
        .add_holiday(&principal, body.therapist_id, body.date, body.reason)
        .await
        .map_err(domain_error)?;
    ok(holiday.into())
}
