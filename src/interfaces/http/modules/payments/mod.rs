//! Payment ledger endpoints

pub mod dto;
pub mod handlers;
