//! Port to the profile store that owns therapists and children

use async_trait::async_trait;

use super::DomainResult;

/// Existence checks against the external profile store.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn therapist_exists(&self, therapist_id: &str) -> DomainResult<bool>;

    /// The child must exist and belong to `parent_id`.
    async fn child_belongs_to(&self, parent_id: &str, child_id: &str) -> DomainResult<bool>;
}
