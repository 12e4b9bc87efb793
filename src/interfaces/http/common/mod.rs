//! Shared HTTP types: response envelope, pagination, error mapping

mod validated_json;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::errors::DomainError;
use crate::shared::pagination::{self, PaginatedResult};

/// Standard API response envelope
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Conflict(_)
        | DomainError::SlotConflict { .. }
        | DomainError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error(error: DomainError) -> ApiError {
    let status = status_for(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "Request failed");
    }
    (status, Json(ApiResponse::error(error.to_string())))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, IntoParams)]
pub struct PaginationParams {
    /// Page number, 1-based. Default: 1
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (1-100). Default: 50
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl From<PaginationParams> for pagination::PaginationParams {
    fn from(p: PaginationParams) -> Self {
        pagination::PaginationParams::new(p.page, p.limit)
    }
}

/// Paginated list payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn from_result<U>(result: PaginatedResult<U>, f: impl FnMut(U) -> T) -> Self {
        let mapped = result.map(f);
        Self {
            items: mapped.items,
            total: mapped.total,
            page: mapped.page,
            limit: mapped.limit,
            total_pages: mapped.total_pages,
        }
    }
}

/// Parse a comma-separated query value with `parse`, naming `field` on failure.
pub fn parse_csv<T>(
    raw: Option<&str>,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(s).ok_or_else(|| bad_request(format!("{}: unknown value '{}'", field, s))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookingStatus;

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::not_found("Booking", "b"), StatusCode::NOT_FOUND),
            (DomainError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                DomainError::SlotConflict {
                    slot_id: "s".into(),
                    reserved_before_failure: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::InvalidStateTransition {
                    entity: "Booking",
                    from: "A".into(),
                    to: "B".into(),
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(status_for(&error), status, "{error}");
        }
    }

    #[test]
    fn csv_values_are_parsed_and_checked() {
        let parsed = parse_csv(Some("CONFIRMED, NO_SHOW"), "status", BookingStatus::parse).unwrap();
        assert_eq!(parsed, vec![BookingStatus::Confirmed, BookingStatus::NoShow]);

        assert!(parse_csv(None, "status", BookingStatus::parse).unwrap().is_empty());

        let (status, _) = parse_csv(Some("DONE"), "status", BookingStatus::parse).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
