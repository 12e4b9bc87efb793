//! Session completion and therapist settlement endpoints

pub mod dto;
pub mod handlers;
