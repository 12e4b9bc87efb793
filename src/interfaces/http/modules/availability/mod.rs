//! Availability search endpoints

pub mod dto;
pub mod handlers;
