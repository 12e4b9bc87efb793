//! SeaORM implementation of BookingRepository

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};

use crate::domain::booking::{Booking, BookingFilter, BookingRepository, Initiator};
use crate::domain::status::BookingStatus;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, payment};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn paginate(
        &self,
        query: Select<booking::Entity>,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>> {
        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let models = query
            .order_by_asc(booking::Column::ScheduledAt)
            .order_by_asc(booking::Column::SessionNumber)
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

// ── Conversion helpers ──────────────────────────────────────────

fn parse_status(s: &str) -> DomainResult<BookingStatus> {
    BookingStatus::parse(s)
        .ok_or_else(|| DomainError::Storage(format!("unknown booking status {}", s)))
}

pub(super) fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = parse_status(&m.status)?;
    let cancelled_by = match m.cancelled_by.as_deref() {
        Some(s) => Some(
            Initiator::parse(s)
                .ok_or_else(|| DomainError::Storage(format!("unknown initiator {}", s)))?,
        ),
        None => None,
    };
    Ok(Booking {
        id: m.id,
        payment_id: m.payment_id,
        group_key: m.group_key,
        parent_id: m.parent_id,
        therapist_id: m.therapist_id,
        child_id: m.child_id,
        slot_id: m.slot_id,
        session_number: m.session_number,
        scheduled_at: m.scheduled_at,
        fee_share: m.fee_share,
        status,
        refund_amount: m.refund_amount,
        therapist_note: m.therapist_note,
        cancelled_by,
        cancelled_at: m.cancelled_at,
        completed_at: m.completed_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
        version: m.version,
    })
}

pub(super) fn domain_to_active(b: Booking) -> booking::ActiveModel {
    booking::ActiveModel {
        id: Set(b.id),
        payment_id: Set(b.payment_id),
        group_key: Set(b.group_key),
        parent_id: Set(b.parent_id),
        therapist_id: Set(b.therapist_id),
        child_id: Set(b.child_id),
        slot_id: Set(b.slot_id),
        session_number: Set(b.session_number),
        scheduled_at: Set(b.scheduled_at),
        fee_share: Set(b.fee_share),
        status: Set(b.status.as_str().to_string()),
        refund_amount: Set(b.refund_amount),
        therapist_note: Set(b.therapist_note),
        cancelled_by: Set(b.cancelled_by.map(|i| i.as_str().to_string())),
        cancelled_at: Set(b.cancelled_at),
        completed_at: Set(b.completed_at),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
        version: Set(b.version),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

fn apply_filter(mut query: Select<booking::Entity>, filter: &BookingFilter) -> Select<booking::Entity> {
    if !filter.statuses.is_empty() {
        query = query.filter(booking::Column::Status.is_in(filter.statuses.iter().map(|s| s.as_str())));
    }
    if let Some(from) = filter.scheduled_from {
        query = query.filter(booking::Column::ScheduledAt.gte(from));
    }
    if let Some(to) = filter.scheduled_to {
        query = query.filter(booking::Column::ScheduledAt.lte(to));
    }
    // Session type lives on the owning payment
    if let Some(session_type) = filter.session_type {
        query = query.filter(
            booking::Column::PaymentId.in_subquery(
                Query::select()
                    .column(payment::Column::Id)
                    .from(payment::Entity)
                    .and_where(payment::Column::SessionType.eq(session_type.as_str()))
                    .to_owned(),
            ),
        );
    }
    query
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_payment(&self, payment_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::PaymentId.eq(payment_id))
            .order_by_asc(booking::Column::SessionNumber)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_for_parent(
        &self,
        parent_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>> {
        let query = booking::Entity::find().filter(booking::Column::ParentId.eq(parent_id));
        self.paginate(apply_filter(query, filter), page).await
    }

    async fn find_for_therapist(
        &self,
        therapist_id: &str,
        filter: &BookingFilter,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Booking>> {
        let query = booking::Entity::find().filter(booking::Column::TherapistId.eq(therapist_id));
        self.paginate(apply_filter(query, filter), page).await
    }

    async fn status_counts_for_therapist(
        &self,
        therapist_id: &str,
    ) -> DomainResult<BTreeMap<BookingStatus, u64>> {
        let rows: Vec<(String, i64)> = booking::Entity::find()
            .select_only()
            .column(booking::Column::Status)
            .column_as(booking::Column::Id.count(), "count")
            .filter(booking::Column::TherapistId.eq(therapist_id))
            .group_by(booking::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut counts = BTreeMap::new();
        for (status, count) in rows {
            counts.insert(parse_status(&status)?, count.max(0) as u64);
        }
        Ok(counts)
    }
}
