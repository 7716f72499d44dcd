use chrono::{Duration, NaiveDate};

use crate::models::{DailyBucket, Prediction};

/// Trailing days the regression is fitted on.
pub const REGRESSION_WINDOW_DAYS: usize = 14;
pub const MIN_HISTORY_DAYS: usize = 7;
pub const FORECAST_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares fit of `y` against `x`. A degenerate x-spread
/// yields a flat line through the mean.
pub fn linear_regression(points: &[(f64, f64)]) -> Regression {
    if points.is_empty() {
        return Regression {
            slope: 0.0,
            intercept: 0.0,
        };
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.0).sum();
    let sum_y: f64 = points.iter().map(|p| p.1).sum();
    let sum_xx: f64 = points.iter().map(|p| p.0 * p.0).sum();
    let sum_xy: f64 = points.iter().map(|p| p.0 * p.1).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    let slope = if denominator == 0.0 {
        0.0
    } else {
        (n * sum_xy - sum_x * sum_y) / denominator
    };
    let intercept = (sum_y - slope * sum_x) / n;

    Regression { slope, intercept }
}

/// Projects daily calories for the seven days after `today`.
///
/// Returns an empty list when the trailing window holds fewer than seven
/// days, or fewer than seven days with any logged meal. Step `i` is
/// evaluated at `x = window_len + i` with confidence `max(60, 95 - 5i)`.
pub fn predict_next_7_days(daily: &[DailyBucket], today: NaiveDate) -> Vec<Prediction> {
    let start = daily.len().saturating_sub(REGRESSION_WINDOW_DAYS);
    let recent = &daily[start..];

    let logged_days = recent.iter().filter(|day| day.meal_count > 0).count();
    if recent.len() < MIN_HISTORY_DAYS || logged_days < MIN_HISTORY_DAYS {
        return Vec::new();
    }

    let points: Vec<(f64, f64)> = recent
        .iter()
        .enumerate()
        .map(|(i, day)| (i as f64, day.total_calories))
        .collect();
    let regression = linear_regression(&points);
    let window = recent.len() as f64;

    (1..=FORECAST_DAYS)
        .map(|step| {
            let projected = regression.predict(window + step as f64).max(0.0);
            Prediction {
                date: today + Duration::days(step as i64),
                predicted_calories: projected.round() as u32,
                confidence_percent: confidence_for_step(step),
            }
        })
        .collect()
}

pub fn confidence_for_step(step: u32) -> u8 {
    95u32.saturating_sub(5 * step).max(60) as u8
}
