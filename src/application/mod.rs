pub mod principal;
pub mod services;

// Re-export key types for convenience
pub use principal::{Principal, Role};
pub use services::{
    AvailabilityQuery, AvailabilitySearch, BookingOrchestrator, BookingView, CancellationOutcome,
    PackageCancellation, PaymentLedger, PayoutConfirmation, RefundRequestService,
    RefundResolution, SessionCompletion, SessionRefund, SettlementEngine, SlotAllocator,
};
