//! Monetary policy: cancellation refunds and therapist settlement
//!
//! Pure, synchronous computations. Tier percentages and hour boundaries are
//! fixed; flat amounts, commission and package windows come from
//! [`PolicyConfig`].

pub mod refund;
pub mod settlement;

use serde::{Deserialize, Serialize};

use crate::domain::payment::Money;

pub use refund::{RefundCalculator, RefundOutcome, RefundTier};
pub use settlement::{SettlementBreakdown, SettlementCalculator};

/// Business terms loaded from the `[policy]` config section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Platform share of each session fee, percent
    pub commission_rate_percent: i64,
    /// Flat credit to the parent on a late therapist cancellation / no-show
    pub late_cancel_compensation: Money,
    /// Flat deduction from the therapist's next settlement for the same events
    pub late_cancel_penalty: Money,
    /// Package refunds within this many days of purchase withhold nothing
    pub package_full_refund_days: i64,
    /// Packages older than this are expired and refund nothing
    pub package_expiry_days: i64,
    /// Withheld between the two windows above, percent
    pub package_processing_fee_percent: i64,
    /// Longest span a single slot generation run may cover
    pub max_generation_months: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            commission_rate_percent: 20,
            late_cancel_compensation: 10_000,
            late_cancel_penalty: 10_000,
            package_full_refund_days: 150,
            package_expiry_days: 365,
            package_processing_fee_percent: 10,
            max_generation_months: 3,
        }
    }
}
