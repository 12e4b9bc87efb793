//! Booking orchestration endpoints

pub mod dto;
pub mod handlers;
