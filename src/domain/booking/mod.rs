//! Booking aggregate

pub mod model;
pub mod repository;

pub use model::{Booking, BookingFilter, Initiator};
pub use repository::BookingRepository;
