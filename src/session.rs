//! Analytics session
//!
//! Holds the most recent [`AnalyticsSnapshot`] and recomputes it wholesale
//! on every refresh. Readers get an `Arc` that is never mutated afterwards.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::forecast;
use crate::insights;
use crate::models::{AnalyticsSnapshot, MealRecord, PlanProfile};
use crate::trends;

/// Days of the daily series treated as "recent" by the insight rules.
pub const RECENT_DAYS: usize = 7;

/// The plan flagged active, else the first plan.
pub fn active_plan(plans: &[PlanProfile]) -> Option<&PlanProfile> {
    plans.iter().find(|plan| plan.is_active).or_else(|| plans.first())
}

/// Runs the full pipeline once. Pure in its inputs.
pub fn compute_snapshot<Tz: TimeZone>(
    meals: &[MealRecord],
    plan: Option<&PlanProfile>,
    now: &DateTime<Tz>,
) -> AnalyticsSnapshot {
    let tz = now.timezone();
    let trends = trends::compute_trends(meals, now);
    let recent_start = trends.daily.len().saturating_sub(RECENT_DAYS);
    let recent_daily = &trends.daily[recent_start..];

    let insights = insights::generate_insights(&trends.daily, recent_daily, meals, plan, &tz);
    let predictions = forecast::predict_next_7_days(&trends.daily, now.date_naive());

    debug!(
        meals = meals.len(),
        insights = insights.len(),
        predictions = predictions.len(),
        "Computed analytics snapshot"
    );

    AnalyticsSnapshot {
        generated_at: now.with_timezone(&Utc),
        daily: trends.daily,
        weekly: trends.weekly,
        insights,
        predictions,
    }
}

#[derive(Debug, Default)]
pub struct AnalyticsSession {
    current: RwLock<Option<Arc<AnalyticsSnapshot>>>,
}

impl AnalyticsSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes everything from the given ledger and plans, replacing the
    /// held snapshot.
    pub fn refresh<Tz: TimeZone>(
        &self,
        meals: &[MealRecord],
        plans: &[PlanProfile],
        now: &DateTime<Tz>,
    ) -> Arc<AnalyticsSnapshot> {
        let snapshot = Arc::new(compute_snapshot(meals, active_plan(plans), now));

        let mut current = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = Some(Arc::clone(&snapshot));

        snapshot
    }

    /// The last computed snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<AnalyticsSnapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
