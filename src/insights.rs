//! Heuristic nutrition insights
//!
//! Every rule is evaluated in a fixed order and all applicable rules fire.
//! The result keeps that order; it is not ranked by score.

use chrono::{TimeZone, Timelike};

use crate::models::{
    DailyBucket, Insight, InsightCategory, InsightKind, MacroSplit, MealRecord, PlanProfile,
};

/// Population standard deviation thresholds for daily calories.
pub const CONSISTENT_STD_DEV: f64 = 200.0;
pub const MODERATE_STD_DEV: f64 = 400.0;

/// Meals considered by the late-night rule (roughly three weeks of dinners).
pub const LATE_NIGHT_SAMPLE: usize = 21;
pub const LATE_NIGHT_HOUR: u32 = 21;
pub const LATE_NIGHT_LIMIT: usize = 7;

pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
pub const CARBS_KCAL_PER_GRAM: f64 = 4.0;
pub const FATS_KCAL_PER_GRAM: f64 = 9.0;

pub fn generate_insights<Tz: TimeZone>(
    daily: &[DailyBucket],
    recent_daily: &[DailyBucket],
    meals: &[MealRecord],
    plan: Option<&PlanProfile>,
    tz: &Tz,
) -> Vec<Insight> {
    [
        Some(consistency_insight(daily)),
        plan.and_then(|plan| protein_insight(recent_daily, plan)),
        late_night_insight(meals, tz),
        macro_balance_insight(recent_daily),
        Some(hydration_insight()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Population (not Bessel-corrected) standard deviation.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squared_diffs: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    (squared_diffs / n).sqrt()
}

pub fn consistency_insight(daily: &[DailyBucket]) -> Insight {
    let calories: Vec<f64> = daily.iter().map(|day| day.total_calories).collect();
    let std_dev = population_std_dev(&calories);

    if std_dev < CONSISTENT_STD_DEV {
        Insight::new(
            InsightKind::Consistency,
            InsightCategory::Success,
            "Excellent Consistency",
            "Your daily calorie intake is very consistent. This helps maintain steady progress.",
            95,
        )
    } else if std_dev < MODERATE_STD_DEV {
        Insight::new(
            InsightKind::Consistency,
            InsightCategory::Warning,
            "Moderate Variance",
            "Your calorie intake varies moderately. Try to maintain more consistent eating patterns.",
            70,
        )
    } else {
        Insight::new(
            InsightKind::Consistency,
            InsightCategory::Alert,
            "High Variance Detected",
            "Your daily calories fluctuate significantly. Consider meal planning for better consistency.",
            45,
        )
    }
}

pub fn protein_insight(recent_daily: &[DailyBucket], plan: &PlanProfile) -> Option<Insight> {
    if recent_daily.is_empty() {
        return None;
    }

    let avg_protein =
        recent_daily.iter().map(|day| day.total_protein).sum::<f64>() / recent_daily.len() as f64;

    if avg_protein >= plan.protein_target * 0.9 {
        Some(Insight::new(
            InsightKind::ProteinAdequacy,
            InsightCategory::Success,
            "Protein Goals Met",
            format!(
                "Averaging {}g protein daily. Great for muscle maintenance!",
                avg_protein.round()
            ),
            90,
        ))
    } else if avg_protein >= plan.protein_target * 0.7 {
        Some(Insight::new(
            InsightKind::ProteinAdequacy,
            InsightCategory::Info,
            "Protein Slightly Low",
            format!(
                "Averaging {}g daily. Target is {}g. Add more lean proteins.",
                avg_protein.round(),
                plan.protein_target
            ),
            65,
        ))
    } else {
        None
    }
}

/// Counts late meals among the most recent ones. The ledger is re-sorted by
/// timestamp first so the sample does not depend on insertion order.
pub fn late_night_insight<Tz: TimeZone>(meals: &[MealRecord], tz: &Tz) -> Option<Insight> {
    let mut recent: Vec<&MealRecord> = meals.iter().collect();
    recent.sort_by_key(|meal| meal.timestamp);
    let skip = recent.len().saturating_sub(LATE_NIGHT_SAMPLE);

    let late_meals = recent
        .iter()
        .skip(skip)
        .filter(|meal| meal.timestamp.with_timezone(tz).hour() >= LATE_NIGHT_HOUR)
        .count();

    if late_meals > LATE_NIGHT_LIMIT {
        Some(Insight::new(
            InsightKind::LateNightEating,
            InsightCategory::Warning,
            "Late Night Eating",
            format!(
                "{} meals after 9 PM in the last 3 weeks. Earlier eating may improve sleep quality.",
                late_meals
            ),
            50,
        ))
    } else {
        None
    }
}

/// Macro-calorie split over the given days, or `None` when no macros were logged.
pub fn macro_split(days: &[DailyBucket]) -> Option<MacroSplit> {
    let (protein, carbs, fats) = days.iter().fold((0.0, 0.0, 0.0), |acc, day| {
        (
            acc.0 + day.total_protein,
            acc.1 + day.total_carbs,
            acc.2 + day.total_fats,
        )
    });

    let protein_kcal = protein * PROTEIN_KCAL_PER_GRAM;
    let carbs_kcal = carbs * CARBS_KCAL_PER_GRAM;
    let fats_kcal = fats * FATS_KCAL_PER_GRAM;
    let total_kcal = protein_kcal + carbs_kcal + fats_kcal;

    if total_kcal <= 0.0 {
        return None;
    }

    let protein_percent = protein_kcal * 100.0 / total_kcal;
    let carbs_percent = carbs_kcal * 100.0 / total_kcal;
    let fats_percent = fats_kcal * 100.0 / total_kcal;

    let balanced = (15.0..=35.0).contains(&protein_percent)
        && (45.0..=65.0).contains(&carbs_percent)
        && (20.0..=35.0).contains(&fats_percent);

    Some(MacroSplit {
        protein_percent,
        carbs_percent,
        fats_percent,
        balanced,
    })
}

pub fn macro_balance_insight(recent_daily: &[DailyBucket]) -> Option<Insight> {
    macro_split(recent_daily)
        .filter(|split| split.balanced)
        .map(|_| {
            Insight::new(
                InsightKind::MacroBalance,
                InsightCategory::Success,
                "Balanced Macros",
                "Your protein, carbs, and fats are well-balanced for optimal nutrition.",
                88,
            )
        })
}

pub fn hydration_insight() -> Insight {
    Insight::new(
        InsightKind::Hydration,
        InsightCategory::Info,
        "Stay Hydrated",
        "Remember to drink 8-10 glasses of water daily for optimal metabolism.",
        75,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    fn bucket(day: u32, calories: f64, protein: f64, carbs: f64, fats: f64) -> DailyBucket {
        DailyBucket {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            total_calories: calories,
            total_protein: protein,
            total_carbs: carbs,
            total_fats: fats,
            meal_count: usize::from(calories > 0.0),
        }
    }

    fn calorie_series(values: &[f64]) -> Vec<DailyBucket> {
        values
            .iter()
            .enumerate()
            .map(|(i, &calories)| bucket(i as u32 % 28 + 1, calories, 0.0, 0.0, 0.0))
            .collect()
    }

    fn plan(protein_target: f64) -> PlanProfile {
        PlanProfile {
            id: "default".to_string(),
            name: "Balanced Diet".to_string(),
            calories_target: 2000.0,
            protein_target,
            carbs_target: 200.0,
            fats_target: 65.0,
            is_active: true,
        }
    }

    fn meal_at(timestamp: DateTime<Utc>) -> MealRecord {
        MealRecord {
            id: timestamp.to_rfc3339(),
            name: "Veggie Stir Fry".to_string(),
            timestamp,
            calories: 380.0,
            protein: 18.0,
            carbs: 48.0,
            fats: 14.0,
            portion: 1.0,
            notes: None,
        }
    }

    #[test]
    fn std_dev_is_population_not_sample() {
        assert_eq!(population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn flat_series_is_excellent_consistency() {
        let insight = consistency_insight(&calorie_series(&[1800.0; 30]));
        assert_eq!(insight.title, "Excellent Consistency");
        assert_eq!(insight.category, InsightCategory::Success);
        assert_eq!(insight.score, 95);
    }

    #[test]
    fn std_dev_of_exactly_200_is_moderate() {
        let mut values = vec![0.0; 15];
        values.extend(vec![400.0; 15]);
        let daily = calorie_series(&values);

        let insight = consistency_insight(&daily);
        assert_eq!(insight.title, "Moderate Variance");
        assert_eq!(insight.score, 70);
    }

    #[test]
    fn wide_swings_are_high_variance() {
        let mut values = vec![0.0; 15];
        values.extend(vec![2000.0; 15]);

        let insight = consistency_insight(&calorie_series(&values));
        assert_eq!(insight.title, "High Variance Detected");
        assert_eq!(insight.category, InsightCategory::Alert);
    }

    #[test]
    fn std_dev_of_exactly_400_is_high_variance() {
        let mut values = vec![0.0; 15];
        values.extend(vec![800.0; 15]);

        let insight = consistency_insight(&calorie_series(&values));
        assert_eq!(insight.title, "High Variance Detected");
        assert_eq!(insight.score, 45);
    }

    #[test]
    fn protein_thresholds_are_inclusive() {
        let week = |protein: f64| -> Vec<DailyBucket> {
            (1..=7).map(|day| bucket(day, 2000.0, protein, 0.0, 0.0)).collect()
        };

        let met = protein_insight(&week(90.0), &plan(100.0)).unwrap();
        assert_eq!(met.title, "Protein Goals Met");

        let low = protein_insight(&week(70.0), &plan(100.0)).unwrap();
        assert_eq!(low.title, "Protein Slightly Low");
        assert_eq!(
            low.message,
            "Averaging 70g daily. Target is 100g. Add more lean proteins."
        );

        assert!(protein_insight(&week(69.0), &plan(100.0)).is_none());
    }

    #[test]
    fn protein_thresholds() {
        let week = |protein: f64| -> Vec<DailyBucket> {
            (1..=7).map(|day| bucket(day, 2000.0, protein, 0.0, 0.0)).collect()
        };

        let met = protein_insight(&week(140.0), &plan(150.0)).unwrap();
        assert_eq!(met.title, "Protein Goals Met");
        assert_eq!(
            met.message,
            "Averaging 140g protein daily. Great for muscle maintenance!"
        );

        let low = protein_insight(&week(110.0), &plan(150.0)).unwrap();
        assert_eq!(low.title, "Protein Slightly Low");
        assert_eq!(
            low.message,
            "Averaging 110g daily. Target is 150g. Add more lean proteins."
        );

        assert!(protein_insight(&week(50.0), &plan(150.0)).is_none());
    }

    #[test]
    fn late_night_rule_needs_more_than_seven() {
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 22, 0, 0).unwrap();
        let mut meals: Vec<MealRecord> = (0..8).map(|i| meal_at(base + Duration::days(i))).collect();

        let insight = late_night_insight(&meals, &Utc).unwrap();
        assert_eq!(insight.score, 50);
        assert!(insight.message.starts_with("8 meals after 9 PM"));

        meals.pop();
        assert!(late_night_insight(&meals, &Utc).is_none());
    }

    #[test]
    fn late_night_rule_only_samples_most_recent_meals() {
        let base = Utc.with_ymd_and_hms(2026, 9, 1, 22, 0, 0).unwrap();
        // Eight old late meals followed by 21 recent lunches, stored newest first.
        let mut meals: Vec<MealRecord> = (0..8).map(|i| meal_at(base + Duration::days(i))).collect();
        let lunch = Utc.with_ymd_and_hms(2026, 9, 20, 12, 0, 0).unwrap();
        meals.extend((0..21).map(|i| meal_at(lunch + Duration::days(i))));
        meals.reverse();

        assert!(late_night_insight(&meals, &Utc).is_none());
    }

    #[test]
    fn macro_balance_boundaries_are_inclusive() {
        // 135 kcal protein, 585 kcal carbs, 180 kcal fats: 15% / 65% / 20%.
        let days = vec![bucket(1, 900.0, 33.75, 146.25, 20.0)];
        let split = macro_split(&days).unwrap();

        assert_eq!(split.protein_percent, 15.0);
        assert_eq!(split.carbs_percent, 65.0);
        assert_eq!(split.fats_percent, 20.0);
        assert!(split.balanced);
        assert_eq!(macro_balance_insight(&days).unwrap().title, "Balanced Macros");
    }

    #[test]
    fn macro_balance_skips_empty_and_unbalanced_days() {
        let empty: Vec<DailyBucket> = (1..=7).map(|day| bucket(day, 0.0, 0.0, 0.0, 0.0)).collect();
        assert!(macro_split(&empty).is_none());
        assert!(macro_balance_insight(&empty).is_none());

        let keto = vec![bucket(1, 1800.0, 100.0, 20.0, 140.0)];
        assert!(!macro_split(&keto).unwrap().balanced);
        assert!(macro_balance_insight(&keto).is_none());
    }

    #[test]
    fn rules_fire_in_fixed_order() {
        let daily: Vec<DailyBucket> = (1..=30)
            .map(|day| bucket(day % 28 + 1, 2000.0, 150.0, 260.0, 70.0))
            .collect();
        let recent = &daily[23..];

        let insights = generate_insights(&daily, recent, &[], Some(&plan(150.0)), &Utc);
        let kinds: Vec<InsightKind> = insights.iter().map(|i| i.kind).collect();

        assert_eq!(
            kinds,
            vec![
                InsightKind::Consistency,
                InsightKind::ProteinAdequacy,
                InsightKind::MacroBalance,
                InsightKind::Hydration,
            ]
        );
    }

    #[test]
    fn missing_plan_skips_protein_rule() {
        let daily = calorie_series(&[0.0; 30]);
        let insights = generate_insights(&daily, &daily[23..], &[], None, &Utc);

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].title, "Excellent Consistency");
        assert_eq!(insights[1].title, "Stay Hydrated");
    }
}
