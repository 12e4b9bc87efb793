//! # Session Booking
//!
//! Booking and settlement core for a therapy-session marketplace: therapist
//! slot generation, availability search, package payments, booking
//! lifecycles, cancellation refunds and therapist payouts.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Entities, status machines, monetary policy and repository traits
//! - **application**: Services orchestrating the domain over a repository provider
//! - **infrastructure**: SeaORM persistence, in-memory storage, JWT verification
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Errors, pagination and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

// Re-export API router
pub use interfaces::http::create_api_router;
