use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::models::{DailyBucket, MacroTotals, MealRecord, WeeklyBucket};

pub const DAILY_WINDOW_DAYS: usize = 30;
pub const WEEKLY_WINDOW_WEEKS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Trends {
    pub daily: Vec<DailyBucket>,
    pub weekly: Vec<WeeklyBucket>,
}

/// Calendar date of a meal as seen from `tz`.
pub fn local_date<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

pub fn sum_meals<'a>(meals: impl IntoIterator<Item = &'a MealRecord>) -> MacroTotals {
    meals
        .into_iter()
        .fold(MacroTotals::default(), |acc, meal| MacroTotals {
            calories: acc.calories + meal.calories,
            protein: acc.protein + meal.protein,
            carbs: acc.carbs + meal.carbs,
            fats: acc.fats + meal.fats,
            meal_count: acc.meal_count + 1,
        })
}

/// Builds the 30-day daily series and the 12-week weekly series ending at `now`.
///
/// Daily buckets match meals by local calendar date. Weekly windows are
/// instant ranges `[now - (i*7 + 7) days, +7 days)` and report totals
/// divided by 7 whether or not every day in the window was logged.
pub fn compute_trends<Tz: TimeZone>(meals: &[MealRecord], now: &DateTime<Tz>) -> Trends {
    Trends {
        daily: daily_series(meals, now),
        weekly: weekly_series(meals, now),
    }
}

pub fn daily_series<Tz: TimeZone>(meals: &[MealRecord], now: &DateTime<Tz>) -> Vec<DailyBucket> {
    let tz = now.timezone();
    let today = now.date_naive();
    let dated: Vec<(NaiveDate, &MealRecord)> = meals
        .iter()
        .map(|meal| (local_date(&meal.timestamp, &tz), meal))
        .collect();

    (0..DAILY_WINDOW_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago as i64);
            let totals = sum_meals(
                dated
                    .iter()
                    .filter(|(meal_date, _)| *meal_date == date)
                    .map(|(_, meal)| *meal),
            );

            DailyBucket {
                date,
                total_calories: totals.calories,
                total_protein: totals.protein,
                total_carbs: totals.carbs,
                total_fats: totals.fats,
                meal_count: totals.meal_count,
            }
        })
        .collect()
}

pub fn weekly_series<Tz: TimeZone>(meals: &[MealRecord], now: &DateTime<Tz>) -> Vec<WeeklyBucket> {
    let now_utc = now.with_timezone(&Utc);

    (0..WEEKLY_WINDOW_WEEKS)
        .rev()
        .map(|weeks_ago| {
            let week_start = now_utc - Duration::days((weeks_ago * 7 + 7) as i64);
            let week_end = week_start + Duration::days(7);
            let totals = sum_meals(
                meals
                    .iter()
                    .filter(|meal| meal.timestamp >= week_start && meal.timestamp < week_end),
            );

            WeeklyBucket {
                week_label: format!("Week {}", WEEKLY_WINDOW_WEEKS - weeks_ago),
                week_start,
                avg_calories: totals.calories / 7.0,
                avg_protein: totals.protein / 7.0,
                avg_carbs: totals.carbs / 7.0,
                avg_fats: totals.fats / 7.0,
                total_meals: totals.meal_count,
            }
        })
        .collect()
}
