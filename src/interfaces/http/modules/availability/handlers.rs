//! Availability API handlers

use axum::extract::{Path, Query, State};

use super::dto::{AvailabilitySearchRequest, AvailabilitySearchResponse};
use crate::interfaces::http::common::{domain_error, ok, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::slots::dto::{DateRangeQuery, SlotDto};
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/availability/search",
    tag = "Availability",
    request_body = AvailabilitySearchRequest,
    responses(
        (status = 200, description = "Therapists with a matching bookable slot", body = ApiResponse<AvailabilitySearchResponse>),
        (status = 400, description = "Unknown weekday or bucket")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_availability(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<AvailabilitySearchRequest>,
) -> ApiResult<AvailabilitySearchResponse> {
    let query = body.into_query()?;
    let therapists = state
        .availability
        .query(&query)
        .await
        .map_err(domain_error)?;
    ok(AvailabilitySearchResponse {
        therapist_ids: therapists.into_iter().collect(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/therapists/{id}/available-slots",
    tag = "Availability",
    params(("id" = String, Path, description = "Therapist ID"), DateRangeQuery),
    responses(
        (status = 200, description = "Bookable slots in range", body = ApiResponse<Vec<SlotDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_available_slots(
    State(state): State<AppState>,
    Path(therapist_id): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Vec<SlotDto>> {
    let slots = state
        .availability
        .available_slots(&therapist_id, range.from, range.to)
        .await
        .map_err(domain_error)?;
    ok(slots.into_iter().map(SlotDto::from).collect())
}
