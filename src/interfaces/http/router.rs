//! API router with Swagger UI

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::interfaces::http::common::{ApiResponse, PaginationParams};
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::{
    availability, bookings, health, metrics, payments, refunds, request_id, settlements, slots,
};
use crate::interfaces::http::state::AppState;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token issued by the identity service"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::handlers::health_check,
        // Slots
        slots::handlers::generate_slots,
        slots::handlers::list_therapist_slots,
        slots::handlers::get_slot,
        slots::handlers::update_slot_flags,
        slots::handlers::create_holiday,
        // Availability
        availability::handlers::search_availability,
        availability::handlers::list_available_slots,
        // Payments
        payments::handlers::create_payment,
        payments::handlers::get_payment,
        payments::handlers::mark_payment_paid,
        payments::handlers::mark_payment_failed,
        payments::handlers::apply_refund,
        payments::handlers::list_parent_payments,
        payments::handlers::list_parent_packages,
        payments::handlers::list_parent_credits,
        // Bookings
        bookings::handlers::create_bookings,
        bookings::handlers::cancel_package,
        bookings::handlers::get_booking,
        bookings::handlers::confirm_booking,
        bookings::handlers::cancel_booking,
        bookings::handlers::report_no_show,
        bookings::handlers::list_parent_bookings,
        bookings::handlers::list_therapist_bookings,
        bookings::handlers::therapist_booking_counts,
        // Settlements
        settlements::handlers::complete_session,
        settlements::handlers::preview_settlement,
        settlements::handlers::confirm_payout,
        settlements::handlers::therapist_ledger,
        // Refunds
        refunds::handlers::submit_refund_request,
        refunds::handlers::list_payment_refund_requests,
        refunds::handlers::list_pending_refund_requests,
        refunds::handlers::resolve_refund_request,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginationParams,
            health::handlers::HealthResponse,
            health::handlers::ComponentHealth,
            slots::dto::SlotDto,
            slots::dto::GenerateSlotsRequest,
            slots::dto::DayPatternDto,
            slots::dto::TimeRangeDto,
            slots::dto::GenerationReportDto,
            slots::dto::CreateHolidayRequest,
            slots::dto::HolidayDto,
            slots::dto::UpdateSlotFlagsRequest,
            availability::dto::AvailabilitySearchRequest,
            availability::dto::AvailabilitySearchResponse,
            payments::dto::PaymentDto,
            payments::dto::CreatePaymentRequest,
            payments::dto::ApplyRefundRequest,
            payments::dto::PackageSummaryDto,
            payments::dto::LedgerEntryDto,
            bookings::dto::BookingDto,
            bookings::dto::CreateBookingsRequest,
            bookings::dto::NoShowRequest,
            bookings::dto::RefundOutcomeDto,
            bookings::dto::CancellationDto,
            bookings::dto::PackageCancellationDto,
            bookings::dto::SessionRefundDto,
            bookings::dto::StatusCountsDto,
            settlements::dto::SettlementBreakdownDto,
            settlements::dto::CompleteSessionRequest,
            settlements::dto::SessionCompletionDto,
            settlements::dto::ConfirmPayoutRequest,
            settlements::dto::PayoutConfirmationDto,
            refunds::dto::RefundRequestDto,
            refunds::dto::SubmitRefundRequest,
            refunds::dto::ResolveRefundRequest,
            refunds::dto::RefundResolutionDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Slots", description = "Therapist slot generation, flags and holidays"),
        (name = "Availability", description = "Search for therapists with bookable slots"),
        (name = "Payments", description = "Session packages, collection and refunds"),
        (name = "Bookings", description = "Booking groups, confirmation, cancellation and no-shows"),
        (name = "Settlements", description = "Session completion and therapist payouts"),
        (name = "Refunds", description = "Parent refund requests and admin resolution"),
    ),
    info(
        title = "Session Booking API",
        version = "1.0.0",
        description = "Slot allocation, booking, payment ledger and settlement for therapy sessions",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Routes under `/api/v1`, all behind bearer authentication.
fn protected_routes(state: AppState, auth: AuthState) -> Router {
    Router::new()
        // Slots
        .route("/slots/generate", post(slots::handlers::generate_slots))
        .route("/slots/{id}", get(slots::handlers::get_slot))
        .route("/slots/{id}/flags", patch(slots::handlers::update_slot_flags))
        .route("/holidays", post(slots::handlers::create_holiday))
        .route(
            "/therapists/{id}/slots",
            get(slots::handlers::list_therapist_slots),
        )
        // Availability
        .route(
            "/availability/search",
            post(availability::handlers::search_availability),
        )
        .route(
            "/therapists/{id}/available-slots",
            get(availability::handlers::list_available_slots),
        )
        // Payments
        .route("/payments", post(payments::handlers::create_payment))
        .route("/payments/{id}", get(payments::handlers::get_payment))
        .route("/payments/{id}/paid", post(payments::handlers::mark_payment_paid))
        .route(
            "/payments/{id}/failed",
            post(payments::handlers::mark_payment_failed),
        )
        .route("/payments/{id}/refunds", post(payments::handlers::apply_refund))
        .route(
            "/parents/{id}/payments",
            get(payments::handlers::list_parent_payments),
        )
        .route(
            "/parents/{id}/packages",
            get(payments::handlers::list_parent_packages),
        )
        .route(
            "/parents/{id}/credits",
            get(payments::handlers::list_parent_credits),
        )
        // Bookings
        .route(
            "/payments/{id}/bookings",
            post(bookings::handlers::create_bookings),
        )
        .route("/payments/{id}/cancel", post(bookings::handlers::cancel_package))
        .route("/bookings/{id}", get(bookings::handlers::get_booking))
        .route(
            "/bookings/{id}/confirm",
            post(bookings::handlers::confirm_booking),
        )
        .route("/bookings/{id}/cancel", post(bookings::handlers::cancel_booking))
        .route(
            "/bookings/{id}/no-show",
            post(bookings::handlers::report_no_show),
        )
        .route(
            "/parents/{id}/bookings",
            get(bookings::handlers::list_parent_bookings),
        )
        .route(
            "/therapists/{id}/bookings",
            get(bookings::handlers::list_therapist_bookings),
        )
        .route(
            "/therapists/{id}/booking-counts",
            get(bookings::handlers::therapist_booking_counts),
        )
        // Settlements
        .route(
            "/bookings/{id}/complete",
            post(settlements::handlers::complete_session),
        )
        .route(
            "/payments/{id}/settlement",
            get(settlements::handlers::preview_settlement),
        )
        .route(
            "/payments/{id}/settlement/confirm",
            post(settlements::handlers::confirm_payout),
        )
        .route(
            "/therapists/{id}/ledger",
            get(settlements::handlers::therapist_ledger),
        )
        // Refunds
        .route(
            "/payments/{id}/refund-requests",
            get(refunds::handlers::list_payment_refund_requests)
                .post(refunds::handlers::submit_refund_request),
        )
        .route(
            "/refund-requests/pending",
            get(refunds::handlers::list_pending_refund_requests),
        )
        .route(
            "/refund-requests/{id}/resolve",
            post(refunds::handlers::resolve_refund_request),
        )
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state)
}

/// Create the API router with all routes.
///
/// `/metrics` is mounted only when a Prometheus handle is supplied.
pub fn create_api_router(
    state: AppState,
    auth: AuthState,
    health_state: health::HealthState,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(health_routes)
        .nest("/api/v1", protected_routes(state, auth));

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::application::Role;
    use crate::domain::PolicyConfig;
    use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
    use crate::infrastructure::{InMemoryProfileDirectory, InMemoryRepositoryProvider};

    struct TestApp {
        router: Router,
        jwt: JwtConfig,
    }

    impl TestApp {
        fn new() -> Self {
            let jwt = JwtConfig::default();
            let profiles = Arc::new(
                InMemoryProfileDirectory::new()
                    .with_therapist("th-1")
                    .with_child("parent-1", "child-1"),
            );
            let state = AppState::new(
                Arc::new(InMemoryRepositoryProvider::new()),
                profiles,
                &PolicyConfig::default(),
            );
            let router = create_api_router(
                state,
                AuthState { jwt_config: jwt.clone() },
                health::HealthState::new(None),
                None,
            );
            Self { router, jwt }
        }

        fn token(&self, id: &str, role: Role) -> String {
            create_token(id, role, &self.jwt).unwrap()
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let body = match body {
                Some(v) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(serde_json::to_vec(&v).unwrap())
                }
                None => Body::empty(),
            };
            let resp = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, doc) = app.send("GET", "/api-doc/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/v1/bookings/{id}/cancel"].is_object());
    }

    #[tokio::test]
    async fn api_rejects_missing_token() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/v1/payments/p-1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn booking_flow_over_http() {
        let app = TestApp::new();
        let therapist = app.token("th-1", Role::Therapist);
        let parent = app.token("parent-1", Role::Parent);
        let stranger = app.token("parent-2", Role::Parent);

        // 2027-03-01 is a Monday
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/slots/generate",
                Some(&therapist),
                Some(json!({
                    "therapist_id": "th-1",
                    "start_date": "2027-03-01",
                    "end_date": "2027-03-07",
                    "weekly_pattern": [
                        {"day": "Mon", "ranges": [{"start": "09:00:00", "end": "11:00:00"}]},
                        {"day": "Wed", "ranges": [{"start": "18:00:00", "end": "19:00:00"}]}
                    ],
                    "session_duration_minutes": 50,
                    "max_capacity": 1
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["created"], 3);

        let (_, body) = app
            .send(
                "POST",
                "/api/v1/availability/search",
                Some(&parent),
                Some(json!({"days_of_week": ["Wed"], "time_buckets": ["EVENING"]})),
            )
            .await;
        assert_eq!(body["data"]["therapist_ids"], json!(["th-1"]));

        let slots_uri = "/api/v1/therapists/th-1/available-slots?from=2027-03-01&to=2027-03-07";
        let (_, body) = app.send("GET", slots_uri, Some(&parent), None).await;
        let slots = body["data"].as_array().unwrap();
        assert_eq!(slots.len(), 3);
        let slot_ids: Vec<Value> = slots[..2].iter().map(|s| s["id"].clone()).collect();

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/payments",
                Some(&parent),
                Some(json!({
                    "parent_id": "parent-1",
                    "therapist_id": "th-1",
                    "child_id": "child-1",
                    "session_type": "THERAPY",
                    "total_sessions": 2,
                    "original_fee": 200000,
                    "discount_rate": 10
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["final_fee"], 180000);
        let payment_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send("GET", &format!("/api/v1/payments/{}", payment_id), Some(&stranger), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/payments/{}/bookings", payment_id),
                Some(&parent),
                Some(json!({"slot_ids": slot_ids})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let booking_id = body["data"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"][0]["fee_share"], 90000);

        let booking_uri = format!("/api/v1/bookings/{}", booking_id);
        let (_, body) = app.send("GET", &booking_uri, Some(&parent), None).await;
        assert_eq!(body["data"]["display_status"], "PAYMENT_PENDING");

        let (status, _) = app
            .send("POST", &format!("/api/v1/payments/{}/paid", payment_id), Some(&parent), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send("POST", &format!("{}/confirm", booking_uri), Some(&therapist), None)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "CONFIRMED");

        let (status, body) = app
            .send("POST", &format!("{}/cancel", booking_uri), Some(&parent), None)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["refund"]["tier"], "PARENT_FULL");
        assert_eq!(body["data"]["refund"]["refund_amount"], 90000);
        assert_eq!(body["data"]["payment"]["status"], "PARTIALLY_REFUNDED");

        // The released slot is bookable again.
        let (_, body) = app.send("GET", slots_uri, Some(&parent), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        // Terminal bookings cannot be cancelled twice.
        let (status, _) = app
            .send("POST", &format!("{}/cancel", booking_uri), Some(&parent), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn domain_errors_map_to_status_codes() {
        let app = TestApp::new();
        let parent = app.token("parent-1", Role::Parent);

        let (status, _) = app
            .send("GET", "/api/v1/bookings/missing", Some(&parent), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/payments",
                Some(&parent),
                Some(json!({
                    "parent_id": "parent-1",
                    "therapist_id": "th-1",
                    "child_id": "child-1",
                    "session_type": "THERAPY",
                    "total_sessions": 1,
                    "original_fee": 100000,
                    "discount_rate": 150
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = app
            .send(
                "GET",
                "/api/v1/parents/parent-1/bookings?status=CONFIRMED,LOST",
                Some(&parent),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
