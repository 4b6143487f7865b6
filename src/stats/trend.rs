//! Body-stat trend using linear regression (linfa)

use chrono::NaiveDate;
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::measurements::{BodyStat, Metric};

/// Minimum data points required for training
const MIN_DATA_POINTS: usize = 3;

/// Linear fit of one metric against days since the first reading
pub struct BodyTrend {
    metric: Metric,
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
    first_date: NaiveDate,
}

/// Trend summary for display
#[derive(Debug, Clone)]
pub struct TrendPrediction {
    pub metric: Metric,
    pub daily_change: f64,
    pub week_prediction: f64,
    pub month_prediction: f64,
    pub r2_score: f64,
    pub data_points: usize,
}

impl BodyTrend {
    /// Fit over the stats that carry `metric`; `None` below three readings
    pub fn fit(stats: &[BodyStat], metric: Metric) -> Option<Self> {
        let points: Vec<(NaiveDate, f64)> = stats
            .iter()
            .filter_map(|s| metric.value(s).map(|v| (s.date, v)))
            .collect();

        if points.len() < MIN_DATA_POINTS {
            return None;
        }

        let first_date = points.iter().map(|(d, _)| *d).min()?;

        // X = days since first reading, Y = metric value
        let (x_data, y_data): (Vec<f64>, Vec<f64>) = points
            .iter()
            .map(|(d, v)| ((*d - first_date).num_days() as f64, *v))
            .unzip();

        let n_samples = x_data.len();
        let records = Array2::from_shape_vec((n_samples, 1), x_data).ok()?;
        let targets = Array1::from_vec(y_data);
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();

        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);
        debug!("{} trend: slope {:.4}, r2 {:.3}", metric.label(), slope, r2_score);

        Some(Self {
            metric,
            slope,
            intercept,
            r2_score,
            data_points: n_samples,
            first_date,
        })
    }

    /// Predicted value `days_ahead` after `today`
    pub fn predict(&self, today: NaiveDate, days_ahead: i64) -> f64 {
        let day = (today - self.first_date).num_days() + days_ahead;
        self.slope * day as f64 + self.intercept
    }

    pub fn daily_change(&self) -> f64 {
        self.slope
    }

    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn summary(&self, today: NaiveDate) -> TrendPrediction {
        TrendPrediction {
            metric: self.metric,
            daily_change: self.slope,
            week_prediction: self.predict(today, 7),
            month_prediction: self.predict(today, 30),
            r2_score: self.r2_score,
            data_points: self.data_points,
        }
    }

    pub fn format_summary(&self, today: NaiveDate) -> String {
        let p = self.summary(today);
        let unit = self.metric.unit();
        [
            format!("--- {} trend ---", self.metric.label()),
            format!("Change per week: {:+.2} {}", p.daily_change * 7.0, unit),
            format!("In 7 days: {:.1} {}", p.week_prediction, unit),
            format!("In 30 days: {:.1} {}", p.month_prediction, unit),
            format!("Fit (R2): {:.2} over {} readings", p.r2_score, p.data_points),
        ]
        .join("\n")
    }
}
