//! Prometheus scrape endpoint
//!
//! Renders whatever the global `metrics-exporter-prometheus` recorder holds:
//! HTTP traffic plus the booking counters described in [`describe_metrics`].

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Register help text for every metric the service emits.
/// Call once after the recorder is installed.
pub fn describe_metrics() {
    describe_counter!("http_requests_total", "HTTP requests by method, route and status");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request latency by method and route"
    );
    describe_counter!(
        "booking_slot_reservations_total",
        "Slot reservation attempts by outcome"
    );
    describe_counter!("booking_groups_created_total", "Booking groups created");
    describe_counter!(
        "booking_cancellations_total",
        "Cancellations and no-shows by responsible party and refund tier"
    );
    describe_counter!("booking_settlements_confirmed_total", "Therapist payouts confirmed");
}

/// `GET /metrics` (no auth)
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}
