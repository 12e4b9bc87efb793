//! Liveness and database health

pub mod handlers;

pub use handlers::{health_check, HealthState};
