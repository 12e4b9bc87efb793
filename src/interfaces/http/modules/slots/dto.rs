//! Slot DTOs

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{GenerationReport, GenerationRequest, Holiday, SlotFlags, TimeRange, TimeSlot, WeeklyPattern};
use crate::interfaces::http::common::{bad_request, ApiError};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotDto {
    pub id: String,
    pub therapist_id: String,
    pub date: NaiveDate,
    /// Mon..Sun
    pub day_of_week: String,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    /// MORNING | AFTERNOON | EVENING
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_bucket: Option<String>,
    pub is_available: bool,
    pub is_holiday: bool,
    pub is_buffer_blocked: bool,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub remaining_capacity: i32,
    pub is_bookable: bool,
}

impl From<TimeSlot> for SlotDto {
    fn from(s: TimeSlot) -> Self {
        Self {
            day_of_week: s.day_of_week().to_string(),
            time_bucket: s.time_bucket().map(|b| b.as_str().to_string()),
            remaining_capacity: s.remaining_capacity(),
            is_bookable: s.is_bookable(),
            id: s.id,
            therapist_id: s.therapist_id,
            date: s.date,
            start_time: s.start_time,
            end_time: s.end_time,
            is_available: s.is_available,
            is_holiday: s.is_holiday,
            is_buffer_blocked: s.is_buffer_blocked,
            max_capacity: s.max_capacity,
            current_bookings: s.current_bookings,
        }
    }
}

/// Working hours on one weekday
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DayPatternDto {
    /// Weekday name, e.g. `Mon` or `monday`
    #[schema(example = "Mon")]
    pub day: String,
    pub ranges: Vec<TimeRangeDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimeRangeDto {
    #[schema(value_type = String, example = "09:00:00")]
    pub start: NaiveTime,
    #[schema(value_type = String, example = "12:00:00")]
    pub end: NaiveTime,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateSlotsRequest {
    #[validate(length(min = 1))]
    pub therapist_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 1, message = "at least one working day is required"))]
    pub weekly_pattern: Vec<DayPatternDto>,
    #[validate(range(min = 1, max = 720))]
    pub session_duration_minutes: u32,
    #[validate(range(min = 1))]
    pub max_capacity: i32,
    #[serde(default = "default_true")]
    pub exclude_holidays: bool,
}

pub fn parse_weekday(raw: &str) -> Result<Weekday, ApiError> {
    raw.parse::<Weekday>()
        .map_err(|_| bad_request(format!("unknown weekday '{}'", raw)))
}

impl GenerateSlotsRequest {
    pub fn into_domain(self) -> Result<GenerationRequest, ApiError> {
        let mut pattern = WeeklyPattern::new();
        for day in self.weekly_pattern {
            let weekday = parse_weekday(&day.day)?;
            for range in day.ranges {
                pattern.add(weekday, TimeRange::new(range.start, range.end));
            }
        }
        Ok(GenerationRequest {
            therapist_id: self.therapist_id,
            start_date: self.start_date,
            end_date: self.end_date,
            weekly_pattern: pattern,
            session_duration_minutes: self.session_duration_minutes,
            max_capacity: self.max_capacity,
            exclude_holidays: self.exclude_holidays,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationReportDto {
    pub created: u64,
    pub skipped_existing: u64,
    pub skipped_holidays: u64,
}

impl From<GenerationReport> for GenerationReportDto {
    fn from(r: GenerationReport) -> Self {
        Self {
            created: r.created,
            skipped_existing: r.skipped_existing,
            skipped_holidays: r.skipped_holidays,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateHolidayRequest {
    /// Omit for a holiday that applies to every therapist
    pub therapist_id: Option<String>,
    pub date: NaiveDate,
    #[validate(length(max = 200))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HolidayDto {
    pub id: String,
    pub therapist_id: Option<String>,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

impl From<Holiday> for HolidayDto {
    fn from(h: Holiday) -> Self {
        Self {
            id: h.id,
            therapist_id: h.therapist_id,
            date: h.date,
            reason: h.reason,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSlotFlagsRequest {
    pub is_available: Option<bool>,
    pub is_holiday: Option<bool>,
    pub is_buffer_blocked: Option<bool>,
}

impl From<UpdateSlotFlagsRequest> for SlotFlags {
    fn from(r: UpdateSlotFlagsRequest) -> Self {
        SlotFlags {
            is_available: r.is_available,
            is_holiday: r.is_holiday,
            is_buffer_blocked: r.is_buffer_blocked,
        }
    }
}

/// Inclusive date window
#[derive(Debug, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_days_are_parsed_case_insensitively() {
        let body: GenerateSlotsRequest = serde_json::from_value(serde_json::json!({
            "therapist_id": "th-1",
            "start_date": "2026-03-02",
            "end_date": "2026-03-08",
            "weekly_pattern": [
                {"day": "monday", "ranges": [{"start": "09:00:00", "end": "12:00:00"}]},
                {"day": "Wed", "ranges": [{"start": "14:00:00", "end": "16:00:00"}]}
            ],
            "session_duration_minutes": 50,
            "max_capacity": 1
        }))
        .unwrap();
        assert!(body.exclude_holidays);

        let req = body.into_domain().unwrap();
        assert_eq!(req.weekly_pattern.ranges_for(Weekday::Mon).len(), 1);
        assert_eq!(req.weekly_pattern.ranges_for(Weekday::Wed).len(), 1);
        assert!(req.weekly_pattern.ranges_for(Weekday::Tue).is_empty());
    }

    #[test]
    fn unknown_weekday_is_rejected() {
        assert!(parse_weekday("Funday").is_err());
    }
}
