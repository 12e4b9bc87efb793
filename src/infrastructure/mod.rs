//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod profiles;
pub mod storage;

pub use database::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use profiles::{InMemoryProfileDirectory, OpenProfileDirectory};
pub use storage::InMemoryRepositoryProvider;
