pub mod booking;
pub mod ledger;
pub mod payment;
pub mod policy;
pub mod profiles;
pub mod refund_request;
pub mod repositories;
pub mod slot;
pub mod status;

// Re-export commonly used types
pub use booking::{Booking, BookingFilter, BookingRepository, Initiator};
pub use ledger::{LedgerEntry, LedgerEntryKind, LedgerRepository};
pub use payment::{
    Money, NewPayment, PackageSummary, Payment, PaymentFilter, PaymentRepository, SessionType,
};
pub use policy::{
    PolicyConfig, RefundCalculator, RefundOutcome, RefundTier, SettlementBreakdown,
    SettlementCalculator,
};
pub use profiles::ProfileDirectory;
pub use refund_request::{RefundRequest, RefundRequestRepository, RefundRequestStatus};
pub use repositories::{DomainResult, RepositoryProvider, Write, WriteBatch};
pub use slot::{
    GenerationReport, GenerationRequest, Holiday, SlotFlags, SlotQuery, SlotRepository,
    TimeBucket, TimeRange, TimeSlot, WeeklyPattern,
};
pub use status::{BookingStatus, DisplayStatus, PaymentStatus};

pub use crate::shared::errors::DomainError;
