//! Availability DTOs

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::AvailabilityQuery;
use crate::domain::TimeBucket;
use crate::interfaces::http::common::{bad_request, ApiError};
use crate::interfaces::http::modules::slots::dto::parse_weekday;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct AvailabilitySearchRequest {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Weekday names; any of them matches
    #[serde(default)]
    #[validate(length(max = 7))]
    pub days_of_week: Vec<String>,
    /// MORNING, AFTERNOON or EVENING; any of them matches
    #[serde(default)]
    #[validate(length(max = 3))]
    pub time_buckets: Vec<String>,
    /// Restrict the search to these therapists
    pub therapist_ids: Option<Vec<String>>,
}

fn parse_bucket(raw: &str) -> Result<TimeBucket, ApiError> {
    TimeBucket::ALL
        .into_iter()
        .find(|b| b.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| bad_request(format!("unknown time bucket '{}'", raw)))
}

impl AvailabilitySearchRequest {
    pub fn into_query(self) -> Result<AvailabilityQuery, ApiError> {
        let days_of_week = self
            .days_of_week
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<Result<Vec<Weekday>, _>>()?;
        let time_buckets = self
            .time_buckets
            .iter()
            .map(|b| parse_bucket(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AvailabilityQuery {
            date_from: self.date_from,
            date_to: self.date_to,
            days_of_week,
            time_buckets,
            candidate_therapists: self.therapist_ids,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilitySearchResponse {
    pub therapist_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_and_days_are_parsed() {
        let req = AvailabilitySearchRequest {
            days_of_week: vec!["Tue".into(), "thursday".into()],
            time_buckets: vec!["evening".into()],
            ..Default::default()
        };
        let q = req.into_query().unwrap();
        assert_eq!(q.days_of_week, vec![Weekday::Tue, Weekday::Thu]);
        assert_eq!(q.time_buckets, vec![TimeBucket::Evening]);
        assert!(q.candidate_therapists.is_none());
    }

    #[test]
    fn unknown_bucket_is_rejected() {
        let req = AvailabilitySearchRequest {
            time_buckets: vec!["NIGHT".into()],
            ..Default::default()
        };
        assert!(req.into_query().is_err());
    }
}
