//! Body measurements: weight, body fat and muscle mass over time

use chrono::{Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyStat {
    pub id: i64,
    pub date: NaiveDate,
    /// kg
    pub weight: Option<f64>,
    /// percent
    pub body_fat: Option<f64>,
    /// kg
    pub muscle_mass: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewBodyStat {
    pub date: Option<NaiveDate>,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub muscle_mass: Option<f64>,
}

impl NewBodyStat {
    /// At least one metric, all finite and positive; body fat at most 100%
    pub fn validate(&self) -> Result<()> {
        let values = [
            (Metric::Weight, self.weight),
            (Metric::BodyFat, self.body_fat),
            (Metric::MuscleMass, self.muscle_mass),
        ];
        if values.iter().all(|(_, v)| v.is_none()) {
            return Err(Error::validation("enter at least one measurement"));
        }
        for (metric, value) in values {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(Error::validation(format!("{} must be a positive number", metric.label())));
                }
            }
        }
        if self.body_fat.is_some_and(|v| v > 100.0) {
            return Err(Error::validation("body fat is a percentage (0-100)"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    #[default]
    Weight,
    BodyFat,
    MuscleMass,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Weight => "Weight",
            Metric::BodyFat => "Body fat",
            Metric::MuscleMass => "Muscle mass",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::BodyFat => "%",
            Metric::Weight | Metric::MuscleMass => "kg",
        }
    }

    pub fn value(&self, stat: &BodyStat) -> Option<f64> {
        match self {
            Metric::Weight => stat.weight,
            Metric::BodyFat => stat.body_fat,
            Metric::MuscleMass => stat.muscle_mass,
        }
    }

    /// Muscle mass should go up, the rest down
    pub fn higher_is_better(&self) -> bool {
        matches!(self, Metric::MuscleMass)
    }
}

/// Look-back window for charts and trends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TimeRange {
    #[value(name = "1m")]
    OneMonth,
    #[default]
    #[value(name = "3m")]
    ThreeMonths,
    #[value(name = "6m")]
    SixMonths,
    #[value(name = "1y")]
    OneYear,
    All,
}

impl TimeRange {
    /// First date inside the window ending at `today`; `None` for all time
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            TimeRange::OneMonth => 1,
            TimeRange::ThreeMonths => 3,
            TimeRange::SixMonths => 6,
            TimeRange::OneYear => 12,
            TimeRange::All => return None,
        };
        today.checked_sub_months(Months::new(months))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
    Neutral,
}

/// First-to-last change of one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub change: f64,
    pub percentage: f64,
    /// Set only when the last three readings move strictly one way
    pub direction: Direction,
}

impl Progress {
    pub fn is_improvement(&self, metric: Metric) -> bool {
        if metric.higher_is_better() { self.change > 0.0 } else { self.change < 0.0 }
    }
}

/// Change between the first and last reading, stats sorted oldest first
pub fn progress(stats: &[BodyStat], metric: Metric) -> Option<Progress> {
    let values: Vec<f64> = stats.iter().filter_map(|s| metric.value(s)).collect();
    let (first, last) = (*values.first()?, *values.last()?);
    if values.len() < 2 || first == 0.0 {
        return None;
    }

    let direction = match values[values.len().saturating_sub(3)..] {
        [a, b, c] if c > b && b > a => Direction::Increasing,
        [a, b, c] if c < b && b < a => Direction::Decreasing,
        _ => Direction::Neutral,
    };

    Some(Progress {
        change: last - first,
        percentage: (last - first) / first * 100.0,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_stat(day: u32, weight: Option<f64>) -> BodyStat {
        BodyStat {
            id: day as i64,
            date: date(2024, 6, day),
            weight,
            body_fat: None,
            muscle_mass: None,
        }
    }

    #[test]
    fn test_requires_one_metric() {
        assert!(NewBodyStat::default().validate().is_err());
        let stat = NewBodyStat {
            muscle_mass: Some(35.0),
            ..Default::default()
        };
        assert!(stat.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let negative = NewBodyStat {
            weight: Some(-80.0),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let fat = NewBodyStat {
            body_fat: Some(120.0),
            ..Default::default()
        };
        assert!(fat.validate().is_err());
    }

    #[test]
    fn test_time_range_start() {
        let today = date(2024, 5, 31);
        assert_eq!(TimeRange::OneMonth.start(today), Some(date(2024, 4, 30)));
        assert_eq!(TimeRange::OneYear.start(today), Some(date(2023, 5, 31)));
        assert_eq!(TimeRange::All.start(today), None);
    }

    #[test]
    fn test_progress_decreasing_weight() {
        let stats = vec![
            create_stat(1, Some(82.0)),
            create_stat(8, Some(81.0)),
            create_stat(15, None),
            create_stat(22, Some(80.0)),
        ];
        let p = progress(&stats, Metric::Weight).unwrap();
        assert_eq!(p.change, -2.0);
        assert_eq!(p.direction, Direction::Decreasing);
        assert!(p.is_improvement(Metric::Weight));
        assert!(!p.is_improvement(Metric::MuscleMass));
    }

    #[test]
    fn test_progress_needs_two_readings() {
        assert!(progress(&[create_stat(1, Some(80.0))], Metric::Weight).is_none());
        assert!(progress(&[], Metric::Weight).is_none());
    }

    #[test]
    fn test_progress_mixed_is_neutral() {
        let stats = vec![create_stat(1, Some(80.0)), create_stat(2, Some(81.0)), create_stat(3, Some(80.5))];
        assert_eq!(progress(&stats, Metric::Weight).unwrap().direction, Direction::Neutral);
    }
}
