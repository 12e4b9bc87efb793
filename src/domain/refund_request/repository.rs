//! Refund request repository interface

use async_trait::async_trait;

use super::model::RefundRequest;
use crate::domain::DomainResult;
use crate::shared::pagination::{PaginatedResult, PaginationParams};

#[async_trait]
pub trait RefundRequestRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RefundRequest>>;

    async fn find_by_payment(&self, payment_id: &str) -> DomainResult<Vec<RefundRequest>>;

    /// Oldest first
    async fn find_pending(&self, page: PaginationParams) -> DomainResult<PaginatedResult<RefundRequest>>;
}
