//! Therapist / parent ledger adjustments
//!
//! Flat penalties, parent compensation credits and post-settlement refund
//! adjustments are recorded here and consumed by the next settlement.

pub mod model;
pub mod repository;

pub use model::{LedgerEntry, LedgerEntryKind};
pub use repository::LedgerRepository;
