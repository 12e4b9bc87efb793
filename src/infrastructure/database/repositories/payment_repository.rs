//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::payment::{Payment, PaymentFilter, PaymentRepository, SessionType};
use crate::domain::status::PaymentStatus;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::payment;
use crate::shared::pagination::{PaginatedResult, PaginationParams};

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: payment::Model) -> DomainResult<Payment> {
    let status = PaymentStatus::parse(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("payment {} has unknown status {}", m.id, m.status))
    })?;
    let session_type = SessionType::parse(&m.session_type).ok_or_else(|| {
        DomainError::Storage(format!(
            "payment {} has unknown session type {}",
            m.id, m.session_type
        ))
    })?;
    Ok(Payment {
        id: m.id,
        parent_id: m.parent_id,
        therapist_id: m.therapist_id,
        child_id: m.child_id,
        session_type,
        total_sessions: m.total_sessions,
        original_fee: m.original_fee,
        discount_rate: m.discount_rate,
        final_fee: m.final_fee,
        refunded_amount: m.refunded_amount,
        status,
        completed_sessions: m.completed_sessions,
        paid_at: m.paid_at,
        settlement_amount: m.settlement_amount,
        settled_at: m.settled_at,
        settlement_note: m.settlement_note,
        created_at: m.created_at,
        updated_at: m.updated_at,
        version: m.version,
    })
}

pub(super) fn domain_to_active(p: Payment) -> payment::ActiveModel {
    payment::ActiveModel {
        id: Set(p.id),
        parent_id: Set(p.parent_id),
        therapist_id: Set(p.therapist_id),
        child_id: Set(p.child_id),
        session_type: Set(p.session_type.as_str().to_string()),
        total_sessions: Set(p.total_sessions),
        original_fee: Set(p.original_fee),
        discount_rate: Set(p.discount_rate),
        final_fee: Set(p.final_fee),
        refunded_amount: Set(p.refunded_amount),
        status: Set(p.status.as_str().to_string()),
        completed_sessions: Set(p.completed_sessions),
        paid_at: Set(p.paid_at),
        settlement_amount: Set(p.settlement_amount),
        settled_at: Set(p.settled_at),
        settlement_note: Set(p.settlement_note),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
        version: Set(p.version),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

// ── PaymentRepository impl ──────────────────────────────────────

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_for_parent(
        &self,
        parent_id: &str,
        filter: &PaymentFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Payment>> {
        let mut query = payment::Entity::find().filter(payment::Column::ParentId.eq(parent_id));

        if !filter.statuses.is_empty() {
            query = query.filter(
                payment::Column::Status.is_in(filter.statuses.iter().map(|s| s.as_str())),
            );
        }
        if let Some(session_type) = filter.session_type {
            query = query.filter(payment::Column::SessionType.eq(session_type.as_str()));
        }
        if let Some(from) = filter.created_from {
            query = query.filter(payment::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.created_to {
            query = query.filter(payment::Column::CreatedAt.lte(to));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let models = query
            .order_by_desc(payment::Column::CreatedAt)
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
