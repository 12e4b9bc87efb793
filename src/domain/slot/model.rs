//! Time slot domain entity

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse time-of-day bucket used by availability search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeBucket {
    /// 06:00 - 12:00
    Morning,
    /// 12:00 - 18:00
    Afternoon,
    /// 18:00 - 22:00
    Evening,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    /// Half-open `[start, end)` bounds of the bucket.
    pub fn bounds(&self) -> (NaiveTime, NaiveTime) {
        let (start, end) = match self {
            Self::Morning => (6, 12),
            Self::Afternoon => (12, 18),
            Self::Evening => (18, 22),
        };
        (hour(start), hour(end))
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let (start, end) = self.bounds();
        time >= start && time < end
    }

    /// Bucket a slot start time falls into; `None` outside 06:00-22:00.
    pub fn of(time: NaiveTime) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.contains(time))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Afternoon => "AFTERNOON",
            Self::Evening => "EVENING",
        }
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// A discrete bookable interval for one therapist on one date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: String,
    pub therapist_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub is_holiday: bool,
    pub is_buffer_blocked: bool,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(
        therapist_id: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        max_capacity: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            therapist_id: therapist_id.into(),
            date,
            start_time,
            end_time,
            is_available: true,
            is_holiday: false,
            is_buffer_blocked: false,
            max_capacity,
            current_bookings: 0,
            created_at: Utc::now(),
        }
    }

    /// Available, not a holiday, not buffer-blocked and under capacity.
    pub fn is_bookable(&self) -> bool {
        self.is_available
            && !self.is_holiday
            && !self.is_buffer_blocked
            && self.current_bookings < self.max_capacity
    }

    pub fn remaining_capacity(&self) -> i32 {
        (self.max_capacity - self.current_bookings).max(0)
    }

    pub fn day_of_week(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn time_bucket(&self) -> Option<TimeBucket> {
        TimeBucket::of(self.start_time)
    }

    /// Scheduled start as a UTC instant.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }

    pub fn matches(&self, query: &SlotQuery) -> bool {
        if let Some(from) = query.date_from {
            if self.date < from {
                return false;
            }
        }
        if let Some(to) = query.date_to {
            if self.date > to {
                return false;
            }
        }
        if !query.days_of_week.is_empty() && !query.days_of_week.contains(&self.day_of_week()) {
            return false;
        }
        if !query.time_buckets.is_empty()
            && !query.time_buckets.iter().any(|b| b.contains(self.start_time))
        {
            return false;
        }
        if let Some(ids) = &query.therapist_ids {
            if !ids.contains(&self.therapist_id) {
                return false;
            }
        }
        self.is_bookable()
    }
}

/// Optional flag overrides applied by an administrator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFlags {
    pub is_available: Option<bool>,
    pub is_holiday: Option<bool>,
    pub is_buffer_blocked: Option<bool>,
}

impl SlotFlags {
    pub fn apply(&self, slot: &mut TimeSlot) {
        if let Some(v) = self.is_available {
            slot.is_available = v;
        }
        if let Some(v) = self.is_holiday {
            slot.is_holiday = v;
        }
        if let Some(v) = self.is_buffer_blocked {
            slot.is_buffer_blocked = v;
        }
    }
}

/// Bookable-slot search. Dimensions combine with AND, values inside one
/// dimension with OR. Empty vectors mean "no constraint".
#[derive(Debug, Clone, Default)]
pub struct SlotQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub days_of_week: Vec<Weekday>,
    pub time_buckets: Vec<TimeBucket>,
    pub therapist_ids: Option<Vec<String>>,
}

/// Holiday date, global when `therapist_id` is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub id: String,
    pub therapist_id: Option<String>,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

impl Holiday {
    pub fn new(therapist_id: Option<String>, date: NaiveDate, reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            therapist_id,
            date,
            reason,
        }
    }
}

/// Working hours inside one day, `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Split into `(start, end)` pairs of exactly `duration_minutes`.
    /// A trailing remainder shorter than one session is dropped.
    pub fn split(&self, duration_minutes: u32) -> Vec<(NaiveTime, NaiveTime)> {
        if duration_minutes == 0 || self.start >= self.end {
            return Vec::new();
        }
        let step = duration_minutes * 60;
        let end = self.end.num_seconds_from_midnight();
        let mut cursor = self.start.num_seconds_from_midnight();
        let mut out = Vec::new();
        while cursor + step <= end {
            let from = NaiveTime::from_num_seconds_from_midnight_opt(cursor, 0);
            let to = NaiveTime::from_num_seconds_from_midnight_opt(cursor + step, 0);
            if let (Some(from), Some(to)) = (from, to) {
                out.push((from, to));
            }
            cursor += step;
        }
        out
    }
}

/// Weekday to working-hours mapping
#[derive(Debug, Clone, Default)]
pub struct WeeklyPattern {
    days: HashMap<Weekday, Vec<TimeRange>>,
}

impl WeeklyPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, day: Weekday, range: TimeRange) -> Self {
        self.add(day, range);
        self
    }

    pub fn add(&mut self, day: Weekday, range: TimeRange) {
        self.days.entry(day).or_default().push(range);
    }

    pub fn ranges_for(&self, day: Weekday) -> &[TimeRange] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    pub fn ranges(&self) -> impl Iterator<Item = &TimeRange> {
        self.days.values().flatten()
    }
}

/// Input of bulk slot generation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub therapist_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekly_pattern: WeeklyPattern,
    pub session_duration_minutes: u32,
    pub max_capacity: i32,
    pub exclude_holidays: bool,
}

/// Outcome of bulk slot generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub created: u64,
    pub skipped_existing: u64,
    pub skipped_holidays: u64,
}
