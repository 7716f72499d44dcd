use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Duration, Utc};

use crate::insights::macro_split;
use crate::models::{AnalyticsSnapshot, DailyProgress, MealRecord, NutrientProgress, PlanProfile};

#[derive(Debug, Clone, PartialEq)]
pub struct MealSummary {
    pub name: String,
    pub count: usize,
    pub avg_calories: f64,
}

/// Groups meals logged since `since` by name, most frequent first.
pub fn summarize_meals(meals: &[MealRecord], since: DateTime<Utc>) -> Vec<MealSummary> {
    let mut map: HashMap<&str, (usize, f64)> = HashMap::new();

    for meal in meals.iter().filter(|meal| meal.timestamp >= since) {
        let entry = map.entry(meal.name.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += meal.calories;
    }

    let mut summaries: Vec<MealSummary> = map
        .into_iter()
        .map(|(name, (count, total_calories))| MealSummary {
            name: name.to_string(),
            count,
            avg_calories: total_calories / count as f64,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    summaries
}

fn progress_line(label: &str, unit: &str, progress: &NutrientProgress) -> String {
    let status = if progress.remaining > 0.0 {
        format!("{:.0}{} remaining", progress.remaining, unit)
    } else {
        format!("{:.0}{} over target", progress.remaining.abs(), unit)
    };

    format!(
        "- {}: {:.0} / {:.0}{} ({:.0}%, {})",
        label, progress.consumed, progress.target, unit, progress.percent, status
    )
}

pub fn build_report(
    snapshot: &AnalyticsSnapshot,
    meals: &[MealRecord],
    plan: Option<&PlanProfile>,
    today: Option<&DailyProgress>,
) -> String {
    let mut output = String::new();
    let plan_label = plan.map(|plan| plan.name.as_str()).unwrap_or("no active plan");

    let _ = writeln!(output, "# CaloCount Nutrition Report");
    let _ = writeln!(
        output,
        "Generated {} against {}",
        snapshot.generated_at.format("%Y-%m-%d %H:%M UTC"),
        plan_label
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Today");

    match today {
        Some(progress) if progress.meal_count > 0 => {
            let _ = writeln!(output, "{}", progress_line("Calories", " kcal", &progress.calories));
            let _ = writeln!(output, "{}", progress_line("Protein", "g", &progress.protein));
            let _ = writeln!(output, "{}", progress_line("Carbs", "g", &progress.carbs));
            let _ = writeln!(output, "{}", progress_line("Fats", "g", &progress.fats));
        }
        _ => {
            let _ = writeln!(output, "No meals logged today.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Insights");

    for insight in snapshot.insights.iter() {
        let _ = writeln!(
            output,
            "- {} **{}** ({}, score {}): {}",
            insight.icon(),
            insight.title,
            insight.category,
            insight.score,
            insight.message
        );
    }

    let recent_start = snapshot.daily.len().saturating_sub(7);
    if let Some(split) = macro_split(&snapshot.daily[recent_start..]) {
        let _ = writeln!(
            output,
            "- Macro split (7 days): protein {:.0}%, carbs {:.0}%, fats {:.0}%",
            split.protein_percent, split.carbs_percent, split.fats_percent
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 7-Day Forecast");

    if snapshot.predictions.is_empty() {
        let _ = writeln!(output, "Not enough data yet. Log meals on at least 7 of the last 14 days.");
    } else {
        for prediction in snapshot.predictions.iter() {
            let _ = writeln!(
                output,
                "- {}: {} kcal ({}% confidence)",
                prediction.date, prediction.predicted_calories, prediction.confidence_percent
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Averages");

    for week in snapshot.weekly.iter().filter(|week| week.total_meals > 0) {
        let _ = writeln!(
            output,
            "- {} (from {}): {:.0} kcal/day, {:.0}g protein/day across {} meals",
            week.week_label,
            week.week_start.date_naive(),
            week.avg_calories,
            week.avg_protein,
            week.total_meals
        );
    }
    if snapshot.weekly.iter().all(|week| week.total_meals == 0) {
        let _ = writeln!(output, "No meals recorded in the last 12 weeks.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last 7 Days");

    for day in snapshot.daily[recent_start..].iter() {
        let _ = writeln!(
            output,
            "- {}: {:.0} kcal, P {:.0}g / C {:.0}g / F {:.0}g ({} meals)",
            day.date, day.total_calories, day.total_protein, day.total_carbs, day.total_fats,
            day.meal_count
        );
    }

    let summaries = summarize_meals(meals, snapshot.generated_at - Duration::days(30));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Logged Meals");

    if summaries.is_empty() {
        let _ = writeln!(output, "No meals recorded in the last 30 days.");
    } else {
        for summary in summaries.iter().take(5) {
            let _ = writeln!(
                output,
                "- {}: {} times (avg {:.0} kcal)",
                summary.name, summary.count, summary.avg_calories
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::daily_progress;
    use crate::session::compute_snapshot;
    use crate::store::default_plans;
    use chrono::TimeZone;

    fn meal(name: &str, timestamp: DateTime<Utc>, calories: f64) -> MealRecord {
        MealRecord {
            id: format!("{}-{}", name, timestamp.timestamp()),
            name: name.to_string(),
            timestamp,
            calories,
            protein: 30.0,
            carbs: 50.0,
            fats: 15.0,
            portion: 1.0,
            notes: None,
        }
    }

    #[test]
    fn summaries_sort_by_frequency() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let meals = vec![
            meal("Chicken Salad", now - Duration::days(1), 400.0),
            meal("Chicken Salad", now - Duration::days(2), 500.0),
            meal("Grilled Steak", now - Duration::days(3), 520.0),
            meal("Grilled Steak", now - Duration::days(45), 520.0),
        ];

        let summaries = summarize_meals(&meals, now - Duration::days(30));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "Chicken Salad");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].avg_calories, 450.0);
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn empty_ledger_report_explains_missing_data() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let plans = default_plans();
        let snapshot = compute_snapshot(&[], plans.first(), &now);
        let progress = daily_progress(&[], &plans[0], &now);

        let report = build_report(&snapshot, &[], plans.first(), Some(&progress));
        assert!(report.contains("against Balanced Diet"));
        assert!(report.contains("No meals logged today."));
        assert!(report.contains("Not enough data yet."));
        assert!(report.contains("💧 **Stay Hydrated**"));
        assert!(report.contains("No meals recorded in the last 12 weeks."));
    }

    #[test]
    fn report_lists_today_and_forecast() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
        let meals: Vec<MealRecord> = (0..14)
            .map(|days_ago| meal("Salmon with Rice", now - Duration::days(days_ago), 1800.0))
            .collect();
        let plans = default_plans();
        let snapshot = compute_snapshot(&meals, plans.first(), &now);
        let progress = daily_progress(&meals, &plans[0], &now);

        let report = build_report(&snapshot, &meals, plans.first(), Some(&progress));
        assert!(report.contains("- Calories: 1800 / 2000 kcal (90%, 200 kcal remaining)"));
        assert!(report.contains("- 2026-10-20: 1800 kcal (90% confidence)"));
        assert!(report.contains("- Salmon with Rice: 14 times (avg 1800 kcal)"));
    }
}
