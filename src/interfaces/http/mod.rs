//! HTTP REST API interfaces
//!
//! - `common`: response envelope, pagination, error mapping, validated JSON
//! - `middleware`: bearer JWT authentication
//! - `modules`: handlers and DTOs per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;

pub use middleware::AuthState;
pub use router::create_api_router;
pub use state::AppState;
