//! Refund request endpoints

pub mod dto;
pub mod handlers;
