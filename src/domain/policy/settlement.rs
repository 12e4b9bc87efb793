//! Therapist settlement computation

use serde::Serialize;

use super::PolicyConfig;
use crate::domain::payment::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettlementBreakdown {
    pub sessions: usize,
    pub gross: Money,
    pub commission: Money,
    pub deductions: Money,
    /// Payout owed, never negative
    pub net: Money,
    /// Deductions beyond `gross - commission`, owed to the next settlement
    pub carried_deficit: Money,
}

#[derive(Debug, Clone)]
pub struct SettlementCalculator {
    policy: PolicyConfig,
}

impl SettlementCalculator {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    pub fn commission_on(&self, fee: Money) -> Money {
        fee * self.policy.commission_rate_percent / 100
    }

    /// Therapist share of an amount, i.e. the amount less commission.
    pub fn therapist_share(&self, amount: Money) -> Money {
        amount - self.commission_on(amount)
    }

    /// `sum(fee - commission)` over settleable sessions, minus deductions.
    pub fn compute(&self, session_fees: &[Money], deductions: &[Money]) -> SettlementBreakdown {
        let gross: Money = session_fees.iter().sum();
        let commission: Money = session_fees.iter().map(|f| self.commission_on(*f)).sum();
        let deductions: Money = deductions.iter().sum();
        let raw = gross - commission - deductions;

        SettlementBreakdown {
            sessions: session_fees.len(),
            gross,
            commission,
            deductions,
            net: raw.max(0),
            carried_deficit: (-raw).max(0),
        }
    }
}

impl Default for SettlementCalculator {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_is_per_session_and_truncated() {
        let calc = SettlementCalculator::default();
        let out = calc.compute(&[70_000, 70_000, 70_000], &[]);
        assert_eq!(out.gross, 210_000);
        assert_eq!(out.commission, 42_000);
        assert_eq!(out.net, 168_000);
        assert_eq!(calc.commission_on(33_333), 6_666);
    }

    #[test]
    fn penalties_reduce_net() {
        let calc = SettlementCalculator::default();
        let out = calc.compute(&[70_000], &[10_000]);
        assert_eq!(out.net, 46_000);
        assert_eq!(out.carried_deficit, 0);
    }

    #[test]
    fn excess_deductions_are_carried() {
        let calc = SettlementCalculator::default();
        let out = calc.compute(&[10_000], &[10_000, 5_000]);
        assert_eq!(out.net, 0);
        assert_eq!(out.carried_deficit, 7_000);
    }
}
