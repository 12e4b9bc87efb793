//! Application services

mod availability;
mod booking_orchestrator;
mod payment_ledger;
mod refund_requests;
mod settlement;
mod slot_allocator;

#[cfg(test)]
pub(crate) mod fixtures;

pub use availability::{AvailabilityQuery, AvailabilitySearch};
pub use booking_orchestrator::{
    BookingOrchestrator, BookingView, CancellationOutcome, PackageCancellation, SessionRefund,
};
pub use payment_ledger::PaymentLedger;
pub use refund_requests::{RefundRequestService, RefundResolution};
pub use settlement::{PayoutConfirmation, SessionCompletion, SettlementEngine};
pub use slot_allocator::SlotAllocator;
