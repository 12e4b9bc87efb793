//! SeaORM implementation of RefundRequestRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::refund_request::{RefundRequest, RefundRequestRepository, RefundRequestStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::refund_request;
use crate::shared::pagination::{PaginatedResult, PaginationParams};

pub struct SeaOrmRefundRequestRepository {
    db: DatabaseConnection,
}

impl SeaOrmRefundRequestRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(super) fn model_to_domain(m: refund_request::Model) -> DomainResult<RefundRequest> {
    let status = RefundRequestStatus::parse(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("refund request {} has unknown status {}", m.id, m.status))
    })?;
    Ok(RefundRequest {
        id: m.id,
        payment_id: m.payment_id,
        booking_id: m.booking_id,
        parent_id: m.parent_id,
        requested_amount: m.requested_amount,
        reason: m.reason,
        status,
        resolved_by: m.resolved_by,
        resolved_at: m.resolved_at,
        resolution_note: m.resolution_note,
        created_at: m.created_at,
        version: m.version,
    })
}

pub(super) fn domain_to_active(r: RefundRequest) -> refund_request::ActiveModel {
    refund_request::ActiveModel {
        id: Set(r.id),
        payment_id: Set(r.payment_id),
        booking_id: Set(r.booking_id),
        parent_id: Set(r.parent_id),
        requested_amount: Set(r.requested_amount),
        reason: Set(r.reason),
        status: Set(r.status.as_str().to_string()),
        resolved_by: Set(r.resolved_by),
        resolved_at: Set(r.resolved_at),
        resolution_note: Set(r.resolution_note),
        created_at: Set(r.created_at),
        version: Set(r.version),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

#[async_trait]
impl RefundRequestRepository for SeaOrmRefundRequestRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RefundRequest>> {
        let model = refund_request::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_payment(&self, payment_id: &str) -> DomainResult<Vec<RefundRequest>> {
        let models = refund_request::Entity::find()
            .filter(refund_request::Column::PaymentId.eq(payment_id))
            .order_by_asc(refund_request::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_pending(&self, page: PaginationParams) -> DomainResult<PaginatedResult<RefundRequest>> {
        let query = refund_request::Entity::find()
            .filter(refund_request::Column::Status.eq(RefundRequestStatus::Pending.as_str()));
        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let models = query
            .order_by_asc(refund_request::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let items = models
            .into_iter()
            .map(model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }
}
