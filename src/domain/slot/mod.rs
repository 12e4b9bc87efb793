//! Time slot aggregate
//!
//! Contains the TimeSlot entity, holidays, weekly generation patterns and
//! the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    GenerationReport, GenerationRequest, Holiday, SlotFlags, SlotQuery, TimeBucket, TimeRange,
    TimeSlot, WeeklyPattern,
};
pub use repository::SlotRepository;
