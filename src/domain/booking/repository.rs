//! Booking repository interface

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::model::{Booking, BookingFilter};
use crate::domain::status::BookingStatus;
use crate::domain::DomainResult;
use crate::shared::pagination::{PaginatedResult, PaginationParams};

/// Read side of bookings. Writes go through `RepositoryProvider::commit`.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>>;

    /// Ordered by session number
    async fn find_by_payment(&self, payment_id: &str) -> DomainResult<Vec<Booking>>;

    /// Ordered by scheduled time
    async fn find_for_parent(
        &self,
        parent_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>>;

    async fn find_for_therapist(
        &self,
        therapist_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>>;

    async fn status_counts_for_therapist(
        &self,
        therapist_id: &str,
    ) -> DomainResult<BTreeMap<BookingStatus, u64>>;
}
