//! Refund request aggregate

pub mod model;
pub mod repository;

pub use model::{RefundRequest, RefundRequestStatus};
pub use repository::RefundRequestRepository;
