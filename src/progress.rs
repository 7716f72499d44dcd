use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{DailyProgress, MacroTotals, MealRecord, NutrientProgress, PlanProfile};
use crate::session::active_plan;
use crate::trends::{local_date, sum_meals};

/// Meals logged on `now`'s local calendar date.
pub fn today_totals<Tz: TimeZone>(meals: &[MealRecord], now: &DateTime<Tz>) -> MacroTotals {
    let tz = now.timezone();
    let today = now.date_naive();
    sum_meals(
        meals
            .iter()
            .filter(|meal| local_date(&meal.timestamp, &tz) == today),
    )
}

pub fn nutrient_progress(consumed: f64, target: f64) -> NutrientProgress {
    let percent = if target > 0.0 {
        (consumed / target * 100.0).min(100.0)
    } else {
        0.0
    };

    NutrientProgress {
        consumed,
        target,
        percent,
        remaining: target - consumed,
    }
}

pub fn daily_progress<Tz: TimeZone>(
    meals: &[MealRecord],
    plan: &PlanProfile,
    now: &DateTime<Tz>,
) -> DailyProgress {
    let totals = today_totals(meals, now);

    DailyProgress {
        calories: nutrient_progress(totals.calories, plan.calories_target),
        protein: nutrient_progress(totals.protein, plan.protein_target),
        carbs: nutrient_progress(totals.carbs, plan.carbs_target),
        fats: nutrient_progress(totals.fats, plan.fats_target),
        meal_count: totals.meal_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(HistoryFilter::Today),
            "week" => Ok(HistoryFilter::Week),
            "month" => Ok(HistoryFilter::Month),
            "all" => Ok(HistoryFilter::All),
            _ => Err(format!("Unknown history filter: {}", s)),
        }
    }
}

/// Meals matching `filter`, newest first. "today" compares local calendar
/// dates; week and month are trailing 7 and 30 day instant windows.
pub fn filter_history<'a, Tz: TimeZone>(
    meals: &'a [MealRecord],
    filter: HistoryFilter,
    now: &DateTime<Tz>,
) -> Vec<&'a MealRecord> {
    let tz = now.timezone();
    let today = now.date_naive();
    let now_utc = now.with_timezone(&Utc);

    let mut selected: Vec<&MealRecord> = meals
        .iter()
        .filter(|meal| match filter {
            HistoryFilter::Today => local_date(&meal.timestamp, &tz) == today,
            HistoryFilter::Week => meal.timestamp >= now_utc - Duration::days(7),
            HistoryFilter::Month => meal.timestamp >= now_utc - Duration::days(30),
            HistoryFilter::All => true,
        })
        .collect();

    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    pub meal_count: usize,
    pub plan_count: usize,
    pub active_plan: Option<String>,
    pub avg_calories_per_meal: Option<f64>,
}

pub fn ledger_stats(meals: &[MealRecord], plans: &[PlanProfile]) -> LedgerStats {
    let totals = sum_meals(meals);

    LedgerStats {
        meal_count: meals.len(),
        plan_count: plans.len(),
        active_plan: active_plan(plans).map(|plan| plan.name.clone()),
        avg_calories_per_meal: (totals.meal_count > 0)
            .then(|| totals.calories / totals.meal_count as f64),
    }
}
