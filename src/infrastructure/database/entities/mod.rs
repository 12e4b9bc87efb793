//! Database entities module

pub mod booking;
pub mod holiday;
pub mod ledger_entry;
pub mod payment;
pub mod refund_request;
pub mod time_slot;

pub use booking::Entity as Booking;
pub use holiday::Entity as Holiday;
pub use ledger_entry::Entity as LedgerEntry;
pub use payment::Entity as Payment;
pub use refund_request::Entity as RefundRequest;
pub use time_slot::Entity as TimeSlot;
