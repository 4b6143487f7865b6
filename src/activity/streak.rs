//! Streaks over logged days (workouts and rest days both count)

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use super::ActivityLogEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streak {
    /// Consecutive days ending today, or yesterday when today is not logged yet
    pub current: u32,
    /// Longest run of consecutive days ever
    pub longest: u32,
}

impl Streak {
    pub fn message(&self) -> &'static str {
        match self.current {
            0 => "Start your streak today!",
            1..=2 => "Keep it going!",
            3..=6 => "You're on fire!",
            7..=13 => "Incredible dedication!",
            14..=29 => "Unstoppable!",
            _ => "Legendary status!",
        }
    }
}

pub fn compute_streak(entries: &[ActivityLogEntry], as_of: NaiveDate) -> Streak {
    streak_from_dates(entries.iter().map(|e| e.date), as_of)
}

/// Streak over raw dates; duplicates are collapsed first
pub fn streak_from_dates(dates: impl IntoIterator<Item = NaiveDate>, as_of: NaiveDate) -> Streak {
    let days: BTreeSet<NaiveDate> = dates.into_iter().collect();

    // Today does not break the streak before it is logged
    let mut cursor = if days.contains(&as_of) { Some(as_of) } else { as_of.pred_opt() };
    let mut current = 0;
    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        current += 1;
        cursor = day.pred_opt();
    }

    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in &days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }

    Streak { current, longest }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Workout,
    Rest,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMark {
    pub date: NaiveDate,
    pub status: DayStatus,
}

/// The seven days ending at `as_of`, oldest first
pub fn week_strip(entries: &[ActivityLogEntry], as_of: NaiveDate) -> [DayMark; 7] {
    std::array::from_fn(|i| {
        let date = as_of.checked_sub_days(Days::new(6 - i as u64)).unwrap_or(as_of);
        let on_day = entries.iter().filter(|e| e.date == date);
        let status = if on_day.clone().any(|e| e.kind.is_rest()) {
            DayStatus::Rest
        } else if on_day.count() > 0 {
            DayStatus::Workout
        } else {
            DayStatus::Empty
        };
        DayMark { date, status }
    })
}
