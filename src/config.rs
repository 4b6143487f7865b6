//! Runtime configuration and the calendar-day policy
//!
//! Every "what day is it" question (the writer's existence check, the
//! streak reader, the rotation) goes through [`Calendar`] so that an entry
//! logged late in the evening lands on the same day everywhere.

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, Utc};
use clap::ValueEnum;

pub const DEFAULT_DB_PATH: &str = "liftlog.db";

/// Which activity rows advance the plan rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CountPolicy {
    /// Only performed workouts; a rest day repeats the due plan
    #[default]
    Workouts,
    /// Every logged day, rest days included
    All,
}

/// Day boundary policy: a fixed UTC offset, or the machine's local zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calendar {
    offset: Option<FixedOffset>,
}

impl Calendar {
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Fixed offset in whole hours east of UTC (-12..=14)
    pub fn with_offset_hours(hours: i32) -> Option<Self> {
        if !(-12..=14).contains(&hours) {
            return None;
        }
        FixedOffset::east_opt(hours * 3600).map(|offset| Self { offset: Some(offset) })
    }

    /// Calendar date an instant falls on under this policy
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self.offset {
            Some(offset) => instant.with_timezone(&offset).date_naive(),
            None => instant.with_timezone(&Local).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

/// Half-open `[start, end)` range covering one calendar day
pub fn day_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    date.checked_add_days(Days::new(1)).map(|next| (date, next))
}

/// Resolved settings shared by all surfaces
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub calendar: Calendar,
    pub count_policy: CountPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            calendar: Calendar::local(),
            count_policy: CountPolicy::default(),
        }
    }
}
