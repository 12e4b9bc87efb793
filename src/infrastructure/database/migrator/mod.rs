//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_time_slots;
mod m20260301_000002_create_holidays;
mod m20260301_000003_create_payments;
mod m20260301_000004_create_bookings;
mod m20260301_000005_create_refund_requests;
mod m20260301_000006_create_ledger_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_time_slots::Migration),
            Box::new(m20260301_000002_create_holidays::Migration),
            Box::new(m20260301_000003_create_payments::Migration),
            Box::new(m20260301_000004_create_bookings::Migration),
            Box::new(m20260301_000005_create_refund_requests::Migration),
            Box::new(m20260301_000006_create_ledger_entries::Migration),
        ]
    }
}
