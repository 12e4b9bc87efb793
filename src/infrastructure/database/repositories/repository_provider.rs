//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, SqlErr, TransactionTrait,
};

use crate::domain::booking::BookingRepository;
use crate::domain::ledger::LedgerRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::refund_request::RefundRequestRepository;
use crate::domain::repositories::{RepositoryProvider, Write, WriteBatch};
use crate::domain::slot::SlotRepository;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, ledger_entry, payment, refund_request};

use super::booking_repository::{self, SeaOrmBookingRepository};
use super::ledger_repository::{self, SeaOrmLedgerRepository};
use super::payment_repository::{self, SeaOrmPaymentRepository};
use super::refund_request_repository::{self, SeaOrmRefundRequestRepository};
use super::slot_repository::SeaOrmSlotRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
/// [`RepositoryProvider::commit`] runs the whole batch in one database
/// transaction.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let payment = repos.payments().find_by_id("p-1").await?;
/// let open = repos.bookings().find_by_payment("p-1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    slots: SeaOrmSlotRepository,
    payments: SeaOrmPaymentRepository,
    bookings: SeaOrmBookingRepository,
    refund_requests: SeaOrmRefundRequestRepository,
    ledger: SeaOrmLedgerRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            slots: SeaOrmSlotRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            refund_requests: SeaOrmRefundRequestRepository::new(db.clone()),
            ledger: SeaOrmLedgerRepository::new(db.clone()),
            db,
        }
    }
}

// ── Batch application ───────────────────────────────────────────

fn write_err(entity: &'static str, e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => {
            DomainError::Conflict(format!("{} already exists: {}", entity, msg))
        }
        _ => DomainError::Storage(e.to_string()),
    }
}

async fn insert<E, A, C>(conn: &C, entity: &'static str, model: A) -> DomainResult<()>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + Send,
    C: ConnectionTrait,
{
    E::insert(model)
        .exec_without_returning(conn)
        .await
        .map_err(|e| write_err(entity, e))?;
    Ok(())
}

/// Write `model` only if the stored row still carries `version`.
async fn update_versioned<E, A, C>(
    conn: &C,
    entity: &'static str,
    id_col: E::Column,
    version_col: E::Column,
    id: String,
    version: i32,
    mut model: A,
) -> DomainResult<()>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + Send,
    C: ConnectionTrait,
{
    model.set(version_col, (version + 1).into());
    let result = E::update_many()
        .set(model)
        .filter(id_col.eq(id.clone()))
        .filter(version_col.eq(version))
        .exec(conn)
        .await
        .map_err(|e| write_err(entity, e))?;

    if result.rows_affected == 1 {
        return Ok(());
    }

    let exists = E::find()
        .filter(id_col.eq(id.clone()))
        .one(conn)
        .await
        .map_err(|e| write_err(entity, e))?
        .is_some();
    if exists {
        Err(DomainError::Conflict(format!(
            "{} {} was modified concurrently (expected version {})",
            entity, id, version
        )))
    } else {
        Err(DomainError::not_found(entity, id))
    }
}

async fn apply<C: ConnectionTrait>(conn: &C, write: Write) -> DomainResult<()> {
    let entity = write.entity();
    match write {
        Write::InsertPayment(p) => insert(conn, entity, payment_repository::domain_to_active(p)).await,
        Write::UpdatePayment(p) => {
            let (id, version) = (p.id.clone(), p.version);
            update_versioned(
                conn,
                entity,
                payment::Column::Id,
                payment::Column::Version,
                id,
                version,
                payment_repository::domain_to_active(p),
            )
            .await
        }
        Write::InsertBooking(b) => insert(conn, entity, booking_repository::domain_to_active(b)).await,
        Write::UpdateBooking(b) => {
            let (id, version) = (b.id.clone(), b.version);
            update_versioned(
                conn,
                entity,
                booking::Column::Id,
                booking::Column::Version,
                id,
                version,
                booking_repository::domain_to_active(b),
            )
            .await
        }
        Write::InsertRefundRequest(r) => {
            insert(conn, entity, refund_request_repository::domain_to_active(r)).await
        }
        Write::UpdateRefundRequest(r) => {
            let (id, version) = (r.id.clone(), r.version);
            update_versioned(
                conn,
                entity,
                refund_request::Column::Id,
                refund_request::Column::Version,
                id,
                version,
                refund_request_repository::domain_to_active(r),
            )
            .await
        }
        Write::InsertLedgerEntry(e) => {
            insert(conn, entity, ledger_repository::domain_to_active(e)).await
        }
        Write::UpdateLedgerEntry(e) => {
            let (id, version) = (e.id.clone(), e.version);
            update_versioned(
                conn,
                entity,
                ledger_entry::Column::Id,
                ledger_entry::Column::Version,
                id,
                version,
                ledger_repository::domain_to_active(e),
            )
            .await
        }
    }
}

// ── RepositoryProvider impl ─────────────────────────────────────

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn refund_requests(&self) -> &dyn RefundRequestRepository {
        &self.refund_requests
    }

    fn ledger(&self) -> &dyn LedgerRepository {
        &self.ledger
    }

    async fn commit(&self, batch: WriteBatch) -> DomainResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        debug!("Committing batch of {} write(s)", batch.len());

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        for write in batch.into_writes() {
            if let Err(e) = apply(&txn, write).await {
                if let Err(rollback) = txn.rollback().await {
                    log::warn!("Rollback failed: {}", rollback);
                }
                return Err(e);
            }
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))
    }
}
