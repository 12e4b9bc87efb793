//! SeaORM implementation of LedgerRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::ledger::{LedgerEntry, LedgerEntryKind, LedgerRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::ledger_entry;

pub struct SeaOrmLedgerRepository {
    db: DatabaseConnection,
}

impl SeaOrmLedgerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(super) fn model_to_domain(m: ledger_entry::Model) -> DomainResult<LedgerEntry> {
    let kind = LedgerEntryKind::parse(&m.kind).ok_or_else(|| {
        DomainError::Storage(format!("ledger entry {} has unknown kind {}", m.id, m.kind))
    })?;
    Ok(LedgerEntry {
        id: m.id,
        kind,
        therapist_id: m.therapist_id,
        parent_id: m.parent_id,
        payment_id: m.payment_id,
        booking_id: m.booking_id,
        amount: m.amount,
        applied_to: m.applied_to,
        applied_at: m.applied_at,
        created_at: m.created_at,
        version: m.version,
    })
}

pub(super) fn domain_to_active(e: LedgerEntry) -> ledger_entry::ActiveModel {
    ledger_entry::ActiveModel {
        id: Set(e.id),
        kind: Set(e.kind.as_str().to_string()),
        therapist_id: Set(e.therapist_id),
        parent_id: Set(e.parent_id),
        payment_id: Set(e.payment_id),
        booking_id: Set(e.booking_id),
        amount: Set(e.amount),
        applied_to: Set(e.applied_to),
        applied_at: Set(e.applied_at),
        created_at: Set(e.created_at),
        version: Set(e.version),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

#[async_trait]
impl LedgerRepository for SeaOrmLedgerRepository {
    async fn outstanding_deductions(&self, therapist_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let deductions = [
            LedgerEntryKind::TherapistPenalty,
            LedgerEntryKind::RefundAdjustment,
            LedgerEntryKind::CarriedDeficit,
        ];
        let models = ledger_entry::Entity::find()
            .filter(ledger_entry::Column::TherapistId.eq(therapist_id))
            .filter(ledger_entry::Column::AppliedTo.is_null())
            .filter(ledger_entry::Column::Kind.is_in(deductions.iter().map(|k| k.as_str())))
            .order_by_asc(ledger_entry::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn parent_credits(&self, parent_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let models = ledger_entry::Entity::find()
            .filter(ledger_entry::Column::ParentId.eq(parent_id))
            .filter(ledger_entry::Column::Kind.eq(LedgerEntryKind::ParentCompensation.as_str()))
            .order_by_desc(ledger_entry::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_for_therapist(&self, therapist_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let models = ledger_entry::Entity::find()
            .filter(ledger_entry::Column::TherapistId.eq(therapist_id))
            .order_by_asc(ledger_entry::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }
}
