//! Cancellation refund computation

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::PolicyConfig;
use crate::domain::booking::Initiator;
use crate::domain::payment::Money;

/// Notice at or above which a parent cancellation refunds in full
const FULL_REFUND_NOTICE_HOURS: i64 = 48;

/// Policy tier applied to a refund, reported with every outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundTier {
    /// Parent, 48h or more before start
    ParentFull,
    /// Parent, 24h to 48h before start
    ParentLate,
    /// Parent, 3h to 24h before start
    ParentShortNotice,
    /// Parent, under 3h before start
    ParentLastMinute,
    ParentNoShow,
    /// Parent cancels before the therapist confirmed
    ParentUnconfirmed,
    /// Therapist declines before confirming
    TherapistRejected,
    /// Therapist, 3h or more before start
    TherapistCancel,
    /// Therapist, under 3h before start
    TherapistLateCancel,
    TherapistNoShow,
    AdminCancel,
    /// Nothing was collected, nothing to return
    Unpaid,
    /// Package, within the full-refund window
    PackageFull,
    /// Package, processing fee withheld
    PackageProcessingFee,
    /// Package older than the expiry window, unused sessions forfeited
    PackageExpired,
}

impl RefundTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentFull => "PARENT_FULL",
            Self::ParentLate => "PARENT_LATE",
            Self::ParentShortNotice => "PARENT_SHORT_NOTICE",
            Self::ParentLastMinute => "PARENT_LAST_MINUTE",
            Self::ParentNoShow => "PARENT_NO_SHOW",
            Self::ParentUnconfirmed => "PARENT_UNCONFIRMED",
            Self::TherapistRejected => "THERAPIST_REJECTED",
            Self::TherapistCancel => "THERAPIST_CANCEL",
            Self::TherapistLateCancel => "THERAPIST_LATE_CANCEL",
            Self::TherapistNoShow => "THERAPIST_NO_SHOW",
            Self::AdminCancel => "ADMIN_CANCEL",
            Self::Unpaid => "UNPAID",
            Self::PackageFull => "PACKAGE_FULL",
            Self::PackageProcessingFee => "PACKAGE_PROCESSING_FEE",
            Self::PackageExpired => "PACKAGE_EXPIRED",
        }
    }
}

impl std::fmt::Display for RefundTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monetary result of a cancellation, no-show or package refund
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundOutcome {
    pub tier: RefundTier,
    /// Base amount the refund was computed from
    pub basis: Money,
    pub refund_percent: i64,
    pub refund_amount: Money,
    /// Part of `basis` kept back from the parent
    pub withheld_amount: Money,
    /// Flat credit owed to the parent
    pub parent_compensation: Money,
    /// Flat deduction from the therapist's next settlement
    pub therapist_penalty: Money,
}

impl RefundOutcome {
    fn percent(tier: RefundTier, basis: Money, percent: i64) -> Self {
        let basis = basis.max(0);
        let refund_amount = basis * percent / 100;
        Self {
            tier,
            basis,
            refund_percent: percent,
            refund_amount,
            withheld_amount: basis - refund_amount,
            parent_compensation: 0,
            therapist_penalty: 0,
        }
    }

    /// Lower the refund to what the payment can still return.
    pub fn capped_at(mut self, refundable: Money) -> Self {
        if self.refund_amount > refundable {
            self.refund_amount = refundable.max(0);
            self.withheld_amount = self.basis - self.refund_amount;
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct RefundCalculator {
    policy: PolicyConfig,
}

impl RefundCalculator {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Parent cancels a confirmed single session.
    /// Boundaries are inclusive on the generous side: exactly 48h still refunds 100%.
    pub fn parent_cancellation(
        &self,
        fee: Money,
        scheduled_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> RefundOutcome {
        let notice = scheduled_at - at;
        let (tier, percent) = if notice >= Duration::hours(FULL_REFUND_NOTICE_HOURS) {
            (RefundTier::ParentFull, 100)
        } else if notice >= Duration::hours(24) {
            (RefundTier::ParentLate, 70)
        } else if notice >= Duration::hours(3) {
            (RefundTier::ParentShortNotice, 50)
        } else {
            (RefundTier::ParentLastMinute, 0)
        };
        RefundOutcome::percent(tier, fee, percent)
    }

    /// True when a parent cancelling now would lose part of the fee.
    pub fn inside_notice_window(&self, scheduled_at: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        scheduled_at - at < Duration::hours(FULL_REFUND_NOTICE_HOURS)
    }

    /// Therapist cancels a confirmed session. The parent always gets 100%;
    /// under 3h notice adds the flat compensation and penalty.
    pub fn therapist_cancellation(
        &self,
        fee: Money,
        scheduled_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> RefundOutcome {
        if scheduled_at - at >= Duration::hours(3) {
            RefundOutcome::percent(RefundTier::TherapistCancel, fee, 100)
        } else {
            self.with_flat_amounts(RefundOutcome::percent(
                RefundTier::TherapistLateCancel,
                fee,
                100,
            ))
        }
    }

    pub fn no_show(&self, fee: Money, absent: Initiator) -> RefundOutcome {
        match absent {
            Initiator::Therapist => self.with_flat_amounts(RefundOutcome::percent(
                RefundTier::TherapistNoShow,
                fee,
                100,
            )),
            Initiator::Parent | Initiator::Admin => {
                RefundOutcome::percent(RefundTier::ParentNoShow, fee, 0)
            }
        }
    }

    /// Full refund with no flat amounts (rejections, admin cancels, unconfirmed).
    pub fn full(&self, fee: Money, tier: RefundTier) -> RefundOutcome {
        RefundOutcome::percent(tier, fee, 100)
    }

    pub fn unpaid(&self, fee: Money) -> RefundOutcome {
        RefundOutcome::percent(RefundTier::Unpaid, fee, 0)
    }

    /// Mid-term refund of the unused part of a package.
    ///
    /// `base = total_fee - used * unit_price`, floored at zero; the purchase
    /// age then selects full refund, processing fee, or forfeiture.
    pub fn package_refund(
        &self,
        total_fee: Money,
        unit_price: Money,
        used_sessions: i64,
        purchased_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> RefundOutcome {
        let base = (total_fee - used_sessions * unit_price).max(0);
        let age_days = (at - purchased_at).num_days();

        if age_days > self.policy.package_expiry_days {
            RefundOutcome::percent(RefundTier::PackageExpired, base, 0)
        } else if age_days > self.policy.package_full_refund_days {
            RefundOutcome::percent(
                RefundTier::PackageProcessingFee,
                base,
                100 - self.policy.package_processing_fee_percent,
            )
        } else {
            RefundOutcome::percent(RefundTier::PackageFull, base, 100)
        }
    }

    fn with_flat_amounts(&self, mut outcome: RefundOutcome) -> RefundOutcome {
        outcome.parent_compensation = self.policy.late_cancel_compensation;
        outcome.therapist_penalty = self.policy.late_cancel_penalty;
        outcome
    }
}

impl Default for RefundCalculator {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 15, 0, 0).unwrap()
    }

    fn before(hours: i64, minutes: i64) -> DateTime<Utc> {
        start() - Duration::hours(hours) - Duration::minutes(minutes)
    }

    #[test]
    fn parent_tier_boundaries_are_exact() {
        let calc = RefundCalculator::default();
        let cases = [
            ((48, 0), 100, RefundTier::ParentFull),
            ((47, 59), 70, RefundTier::ParentLate),
            ((24, 0), 70, RefundTier::ParentLate),
            ((23, 59), 50, RefundTier::ParentShortNotice),
            ((3, 0), 50, RefundTier::ParentShortNotice),
            ((2, 59), 0, RefundTier::ParentLastMinute),
        ];
        for ((h, m), percent, tier) in cases {
            let out = calc.parent_cancellation(70_000, start(), before(h, m));
            assert_eq!(out.refund_percent, percent, "at T-{h}h{m}m");
            assert_eq!(out.tier, tier, "at T-{h}h{m}m");
            assert_eq!(out.refund_amount, 70_000 * percent / 100);
            assert_eq!(out.refund_amount + out.withheld_amount, 70_000);
        }
    }

    #[test]
    fn notice_window_starts_below_48_hours() {
        let calc = RefundCalculator::default();
        assert!(!calc.inside_notice_window(start(), before(48, 0)));
        assert!(calc.inside_notice_window(start(), before(47, 59)));
        assert!(calc.inside_notice_window(start(), start() + Duration::hours(1)));
    }

    #[test]
    fn cancelling_after_start_refunds_nothing() {
        let calc = RefundCalculator::default();
        let out = calc.parent_cancellation(50_000, start(), start() + Duration::minutes(5));
        assert_eq!(out.refund_amount, 0);
        assert_eq!(out.tier, RefundTier::ParentLastMinute);
    }

    #[test]
    fn refund_truncates_fractions() {
        let calc = RefundCalculator::default();
        let out = calc.parent_cancellation(33_333, start(), before(30, 0));
        assert_eq!(out.refund_amount, 23_333);
        assert_eq!(out.withheld_amount, 10_000);
    }

    #[test]
    fn therapist_late_cancel_adds_flat_amounts() {
        let calc = RefundCalculator::default();
        let early = calc.therapist_cancellation(70_000, start(), before(3, 0));
        assert_eq!(early.tier, RefundTier::TherapistCancel);
        assert_eq!(early.refund_amount, 70_000);
        assert_eq!(early.parent_compensation, 0);
        assert_eq!(early.therapist_penalty, 0);

        let late = calc.therapist_cancellation(70_000, start(), before(1, 0));
        assert_eq!(late.tier, RefundTier::TherapistLateCancel);
        assert_eq!(late.refund_amount, 70_000);
        assert_eq!(late.parent_compensation, 10_000);
        assert_eq!(late.therapist_penalty, 10_000);
    }

    #[test]
    fn flat_amounts_do_not_depend_on_fee() {
        let calc = RefundCalculator::default();
        let cheap = calc.no_show(1_000, Initiator::Therapist);
        let pricey = calc.no_show(500_000, Initiator::Therapist);
        assert_eq!(cheap.parent_compensation, pricey.parent_compensation);
        assert_eq!(cheap.therapist_penalty, pricey.therapist_penalty);
        assert_eq!(calc.no_show(70_000, Initiator::Parent).refund_amount, 0);
    }

    #[test]
    fn package_refund_windows() {
        let calc = RefundCalculator::default();
        let bought = start();
        let at_day = |d: i64| bought + Duration::days(d);

        let day100 = calc.package_refund(500_000, 100_000, 2, bought, at_day(100));
        assert_eq!(day100.basis, 300_000);
        assert_eq!(day100.refund_amount, 300_000);
        assert_eq!(day100.tier, RefundTier::PackageFull);

        let day200 = calc.package_refund(500_000, 100_000, 2, bought, at_day(200));
        assert_eq!(day200.refund_amount, 270_000);
        assert_eq!(day200.tier, RefundTier::PackageProcessingFee);

        let day400 = calc.package_refund(500_000, 100_000, 2, bought, at_day(400));
        assert_eq!(day400.refund_amount, 0);
        assert_eq!(day400.tier, RefundTier::PackageExpired);
    }

    #[test]
    fn package_window_edges() {
        let calc = RefundCalculator::default();
        let bought = start();
        let tier_at = |d: i64| {
            calc.package_refund(500_000, 100_000, 0, bought, bought + Duration::days(d))
                .tier
        };
        assert_eq!(tier_at(150), RefundTier::PackageFull);
        assert_eq!(tier_at(151), RefundTier::PackageProcessingFee);
        assert_eq!(tier_at(365), RefundTier::PackageProcessingFee);
        assert_eq!(tier_at(366), RefundTier::PackageExpired);
    }

    #[test]
    fn package_base_never_negative() {
        let calc = RefundCalculator::default();
        let out = calc.package_refund(210_000, 100_000, 3, start(), start());
        assert_eq!(out.basis, 0);
        assert_eq!(out.refund_amount, 0);
    }

    #[test]
    fn cap_limits_refund_to_refundable() {
        let calc = RefundCalculator::default();
        let out = calc.full(70_000, RefundTier::AdminCancel).capped_at(20_000);
        assert_eq!(out.refund_amount, 20_000);
        assert_eq!(out.withheld_amount, 50_000);
    }
}
