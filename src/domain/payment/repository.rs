//! Payment repository interface

use async_trait::async_trait;

use super::model::{Payment, PaymentFilter};
use crate::domain::DomainResult;
use crate::shared::pagination::{PaginatedResult, PaginationParams};

/// Read side of payments. Writes go through `RepositoryProvider::commit`.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>>;

    /// Newest first
    async fn find_for_parent(
        &self,
        parent_id: &str,
        filter: &PaymentFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Payment>>;
}
