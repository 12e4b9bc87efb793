//! Ledger repository interface

use async_trait::async_trait;

use super::model::LedgerEntry;
use crate::domain::DomainResult;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Unapplied therapist deductions, oldest first
    async fn outstanding_deductions(&self, therapist_id: &str) -> DomainResult<Vec<LedgerEntry>>;

    /// Compensation credits owed to a parent, newest first
    async fn parent_credits(&self, parent_id: &str) -> DomainResult<Vec<LedgerEntry>>;

    async fn find_for_therapist(&self, therapist_id: &str) -> DomainResult<Vec<LedgerEntry>>;
}
