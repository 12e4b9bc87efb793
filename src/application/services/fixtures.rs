//! Wiring and data builders shared by the service tests

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};

use super::{
    AvailabilitySearch, BookingOrchestrator, PaymentLedger, RefundRequestService, SettlementEngine,
    SlotAllocator,
};
use crate::application::principal::Principal;
use crate::domain::{
    Booking, NewPayment, Payment, PolicyConfig, RefundCalculator, RepositoryProvider,
    SessionType, SettlementCalculator, SlotRepository, TimeSlot,
};
use crate::infrastructure::profiles::InMemoryProfileDirectory;
use crate::infrastructure::storage::InMemoryRepositoryProvider;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub struct Fixture {
    pub repos: Arc<dyn RepositoryProvider>,
    pub slots: Arc<SlotAllocator>,
    pub availability: AvailabilitySearch,
    pub payments: PaymentLedger,
    pub bookings: BookingOrchestrator,
    pub settlement: SettlementEngine,
    pub refunds: RefundRequestService,
}

impl Fixture {
    pub fn new() -> Self {
        let policy = PolicyConfig::default();
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let profiles = Arc::new(
            InMemoryProfileDirectory::new()
                .with_therapist("th-1")
                .with_therapist("th-2")
                .with_child("parent-1", "child-1"),
        );
        let slots = Arc::new(SlotAllocator::new(
            repos.clone(),
            profiles.clone(),
            policy.max_generation_months,
        ));
        Self {
            availability: AvailabilitySearch::new(repos.clone()),
            payments: PaymentLedger::new(
                repos.clone(),
                profiles,
                SettlementCalculator::new(policy.clone()),
            ),
            bookings: BookingOrchestrator::new(
                repos.clone(),
                slots.clone(),
                RefundCalculator::new(policy.clone()),
            ),
            settlement: SettlementEngine::new(repos.clone(), SettlementCalculator::new(policy.clone())),
            refunds: RefundRequestService::new(repos.clone(), SettlementCalculator::new(policy)),
            slots,
            repos,
        }
    }

    /// A 50-minute slot starting on the hour
    pub async fn slot(&self, therapist: &str, on: NaiveDate, hour: u32, capacity: i32) -> TimeSlot {
        let slot = TimeSlot::new(therapist, on, time(hour, 0), time(hour, 50), capacity);
        self.repos.slots().insert_many(vec![slot.clone()]).await.unwrap();
        slot
    }

    pub fn new_payment(&self, sessions: i32, original_fee: i64, discount: i32) -> NewPayment {
        NewPayment {
            parent_id: "parent-1".into(),
            therapist_id: "th-1".into(),
            child_id: "child-1".into(),
            session_type: SessionType::Therapy,
            total_sessions: sessions,
            original_fee,
            discount_rate: discount,
        }
    }

    pub async fn unpaid_payment(&self, sessions: i32, original_fee: i64, discount: i32) -> Payment {
        self.payments
            .create_payment(
                &Principal::parent("parent-1"),
                self.new_payment(sessions, original_fee, discount),
            )
            .await
            .unwrap()
    }

    pub async fn paid_payment(&self, sessions: i32, original_fee: i64, discount: i32) -> Payment {
        let p = self.unpaid_payment(sessions, original_fee, discount).await;
        self.payments
            .mark_paid(&Principal::parent("parent-1"), &p.id, Utc::now())
            .await
            .unwrap()
    }

    pub async fn book(&self, payment: &Payment, slots: &[&TimeSlot]) -> Vec<Booking> {
        let ids: Vec<String> = slots.iter().map(|s| s.id.clone()).collect();
        self.bookings
            .create_booking_group(&Principal::parent("parent-1"), &payment.id, &ids)
            .await
            .unwrap()
    }

    pub async fn book_confirmed(&self, payment: &Payment, slots: &[&TimeSlot]) -> Vec<Booking> {
        let mut confirmed = Vec::new();
        for booking in self.book(payment, slots).await {
            confirmed.push(
                self.bookings
                    .confirm(&Principal::therapist("th-1"), &booking.id)
                    .await
                    .unwrap(),
            );
        }
        confirmed
    }
}
