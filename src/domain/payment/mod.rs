//! Payment aggregate
//!
//! A payment covers one or more sessions (a package) and owns the booking
//! group keyed by its own id.

pub mod model;
pub mod repository;

pub use model::{Money, NewPayment, PackageSummary, Payment, PaymentFilter, SessionType};
pub use repository::PaymentRepository;
