pub mod availability;
pub mod bookings;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod refunds;
pub mod request_id;
pub mod settlements;
pub mod slots;
