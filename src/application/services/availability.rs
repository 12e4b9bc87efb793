//! Read-only availability queries over bookable slots

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Weekday};
use tracing::debug;

use crate::domain::{DomainError, DomainResult, RepositoryProvider, SlotQuery, TimeBucket, TimeSlot};

/// Search dimensions. Every supplied dimension must match (AND); values
/// inside one dimension are alternatives (OR). Empty means unconstrained.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub days_of_week: Vec<Weekday>,
    pub time_buckets: Vec<TimeBucket>,
    /// Therapists pre-selected by profile attributes such as specialty
    pub candidate_therapists: Option<Vec<String>>,
}

pub struct AvailabilitySearch {
    repos: Arc<dyn RepositoryProvider>,
}

impl AvailabilitySearch {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Therapist ids with at least one bookable slot matching the query.
    /// An empty set is a valid answer.
    pub async fn query(&self, q: &AvailabilityQuery) -> DomainResult<BTreeSet<String>> {
        if let (Some(from), Some(to)) = (q.date_from, q.date_to) {
            if to < from {
                return Err(DomainError::Validation("date_to precedes date_from".into()));
            }
        }
        if matches!(&q.candidate_therapists, Some(ids) if ids.is_empty()) {
            return Ok(BTreeSet::new());
        }

        let slots = self
            .repos
            .slots()
            .search(&SlotQuery {
                date_from: q.date_from,
                date_to: q.date_to,
                days_of_week: q.days_of_week.clone(),
                time_buckets: q.time_buckets.clone(),
                therapist_ids: q.candidate_therapists.clone(),
            })
            .await?;

        let therapists: BTreeSet<String> = slots.into_iter().map(|s| s.therapist_id).collect();
        debug!(matches = therapists.len(), "Availability query");
        Ok(therapists)
    }

    /// Bookable slots of one therapist, ordered by date and time.
    pub async fn available_slots(
        &self,
        therapist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<TimeSlot>> {
        if to < from {
            return Err(DomainError::Validation("`to` precedes `from`".into()));
        }
        self.repos
            .slots()
            .search(&SlotQuery {
                date_from: Some(from),
                date_to: Some(to),
                therapist_ids: Some(vec![therapist_id.to_string()]),
                ..Default::default()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fixtures::{date, Fixture};

    async fn seeded() -> Fixture {
        let fx = Fixture::new();
        // 2026-03-02 Mon, 03-03 Tue
        fx.slot("th-morning", date(2026, 3, 2), 9, 1).await;
        fx.slot("th-evening", date(2026, 3, 3), 19, 1).await;
        let full = fx.slot("th-full", date(2026, 3, 2), 9, 1).await;
        fx.slots.reserve(&full.id).await.unwrap();
        fx
    }

    #[tokio::test]
    async fn dimensions_combine_with_and() {
        let fx = seeded().await;
        let q = AvailabilityQuery {
            days_of_week: vec![Weekday::Tue],
            time_buckets: vec![TimeBucket::Morning],
            ..Default::default()
        };
        assert!(fx.availability.query(&q).await.unwrap().is_empty());

        let q = AvailabilityQuery {
            days_of_week: vec![Weekday::Mon],
            time_buckets: vec![TimeBucket::Morning],
            ..Default::default()
        };
        let found = fx.availability.query(&q).await.unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["th-morning".to_string()]);
    }

    #[tokio::test]
    async fn values_within_dimension_combine_with_or() {
        let fx = seeded().await;
        let q = AvailabilityQuery {
            time_buckets: vec![TimeBucket::Morning, TimeBucket::Evening],
            ..Default::default()
        };
        let found = fx.availability.query(&q).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(!found.contains("th-full"));
    }

    #[tokio::test]
    async fn candidate_set_intersects() {
        let fx = seeded().await;
        let q = AvailabilityQuery {
            candidate_therapists: Some(vec!["th-evening".into(), "th-unknown".into()]),
            ..Default::default()
        };
        let found = fx.availability.query(&q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains("th-evening"));

        let none = AvailabilityQuery {
            candidate_therapists: Some(vec![]),
            ..Default::default()
        };
        assert!(fx.availability.query(&none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inverted_range_is_an_error_not_empty() {
        let fx = seeded().await;
        let q = AvailabilityQuery {
            date_from: Some(date(2026, 3, 5)),
            date_to: Some(date(2026, 3, 1)),
            ..Default::default()
        };
        assert!(matches!(
            fx.availability.query(&q).await,
            Err(DomainError::Validation(_))
        ));
    }
}
