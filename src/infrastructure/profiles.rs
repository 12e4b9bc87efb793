//! Profile directory adapters

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use crate::domain::{DomainResult, ProfileDirectory};

/// Fixed set of known therapists and parent/child pairs
#[derive(Default)]
pub struct InMemoryProfileDirectory {
    therapists: DashMap<String, ()>,
    children: DashMap<String, HashSet<String>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_therapist(self, therapist_id: impl Into<String>) -> Self {
        self.therapists.insert(therapist_id.into(), ());
        self
    }

    pub fn with_child(self, parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        self.children
            .entry(parent_id.into())
            .or_default()
            .insert(child_id.into());
        self
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn therapist_exists(&self, therapist_id: &str) -> DomainResult<bool> {
        Ok(self.therapists.contains_key(therapist_id))
    }

    async fn child_belongs_to(&self, parent_id: &str, child_id: &str) -> DomainResult<bool> {
        Ok(self
            .children
            .get(parent_id)
            .map_or(false, |kids| kids.contains(child_id)))
    }
}

/// Accepts every id. Used when no profile service is configured.
pub struct OpenProfileDirectory;

impl OpenProfileDirectory {
    pub fn new() -> Self {
        warn!("Profile directory not configured; therapist and child ids are not verified");
        Self
    }
}

#[async_trait]
impl ProfileDirectory for OpenProfileDirectory {
    async fn therapist_exists(&self, _therapist_id: &str) -> DomainResult<bool> {
        Ok(true)
    }

    async fn child_belongs_to(&self, _parent_id: &str, _child_id: &str) -> DomainResult<bool> {
        Ok(true)
    }
}
