//! Shared handler state

use std::sync::Arc;

use crate::application::{
    AvailabilitySearch, BookingOrchestrator, PaymentLedger, RefundRequestService,
    SettlementEngine, SlotAllocator,
};
use crate::domain::{
    PolicyConfig, ProfileDirectory, RefundCalculator, RepositoryProvider, SettlementCalculator,
};

/// Every application service, wired over one repository provider
#[derive(Clone)]
pub struct AppState {
    pub slots: Arc<SlotAllocator>,
    pub availability: Arc<AvailabilitySearch>,
    pub payments: Arc<PaymentLedger>,
    pub bookings: Arc<BookingOrchestrator>,
    pub settlement: Arc<SettlementEngine>,
    pub refunds: Arc<RefundRequestService>,
}

impl AppState {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        profiles: Arc<dyn ProfileDirectory>,
        policy: &PolicyConfig,
    ) -> Self {
        let slots = Arc::new(SlotAllocator::new(
            repos.clone(),
            profiles.clone(),
            policy.max_generation_months,
        ));
        Self {
            availability: Arc::new(AvailabilitySearch::new(repos.clone())),
            payments: Arc::new(PaymentLedger::new(
                repos.clone(),
                profiles,
                SettlementCalculator::new(policy.clone()),
            )),
            bookings: Arc::new(BookingOrchestrator::new(
                repos.clone(),
                slots.clone(),
                RefundCalculator::new(policy.clone()),
            )),
            settlement: Arc::new(SettlementEngine::new(
                repos.clone(),
                SettlementCalculator::new(policy.clone()),
            )),
            refunds: Arc::new(RefundRequestService::new(
                repos,
                SettlementCalculator::new(policy.clone()),
            )),
            slots,
        }
    }
}
