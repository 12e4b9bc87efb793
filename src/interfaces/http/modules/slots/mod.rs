//! Slot generation and administration endpoints

pub mod dto;
pub mod handlers;
