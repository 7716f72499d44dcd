use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default = "default_portion")]
    pub portion: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "calories")]
    pub calories_target: f64,
    #[serde(rename = "protein")]
    pub protein_target: f64,
    #[serde(rename = "carbs")]
    pub carbs_target: f64,
    #[serde(rename = "fats")]
    pub fats_target: f64,
    #[serde(rename = "active", default)]
    pub is_active: bool,
}

/// Calorie and macro totals over a set of meals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub meal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
    pub meal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBucket {
    pub week_label: String,
    pub week_start: DateTime<Utc>,
    pub avg_calories: f64,
    pub avg_protein: f64,
    pub avg_carbs: f64,
    pub avg_fats: f64,
    pub total_meals: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Success,
    Warning,
    Alert,
    Info,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::Success => "success",
            InsightCategory::Warning => "warning",
            InsightCategory::Alert => "alert",
            InsightCategory::Info => "info",
        }
    }
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which heuristic produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Consistency,
    ProteinAdequacy,
    LateNightEating,
    MacroBalance,
    Hydration,
}

impl InsightKind {
    /// Display glyph for renderers. Consistency varies with the outcome,
    /// so the category picks between its glyphs.
    pub fn icon(&self, category: InsightCategory) -> &'static str {
        match (self, category) {
            (InsightKind::Consistency, InsightCategory::Success) => "🎯",
            (InsightKind::Consistency, InsightCategory::Warning) => "⚡",
            (InsightKind::Consistency, _) => "📊",
            (InsightKind::ProteinAdequacy, InsightCategory::Success) => "💪",
            (InsightKind::ProteinAdequacy, _) => "🥩",
            (InsightKind::LateNightEating, _) => "🌙",
            (InsightKind::MacroBalance, _) => "⚖️",
            (InsightKind::Hydration, _) => "💧",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub category: InsightCategory,
    pub title: String,
    pub message: String,
    /// 0-100
    pub score: u8,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        category: InsightCategory,
        title: impl Into<String>,
        message: impl Into<String>,
        score: u8,
    ) -> Self {
        Self {
            kind,
            category,
            title: title.into(),
            message: message.into(),
            score,
        }
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon(self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub predicted_calories: u32,
    pub confidence_percent: u8,
}

/// Share of macro-calories per macro, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroSplit {
    pub protein_percent: f64,
    pub carbs_percent: f64,
    pub fats_percent: f64,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub daily: Vec<DailyBucket>,
    pub weekly: Vec<WeeklyBucket>,
    pub insights: Vec<Insight>,
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientProgress {
    pub consumed: f64,
    pub target: f64,
    /// Capped at 100.
    pub percent: f64,
    /// Negative when over target.
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyProgress {
    pub calories: NutrientProgress,
    pub protein: NutrientProgress,
    pub carbs: NutrientProgress,
    pub fats: NutrientProgress,
    pub meal_count: usize,
}

fn default_portion() -> f64 {
    1.0
}

// The browser app stored `Date.now()` ids as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_accepts_numeric_browser_ids() {
        let meal: MealRecord = serde_json::from_str(
            r#"{"id": 1718000000000, "name": "Chicken Salad", "calories": 450,
                "protein": 38, "carbs": 32, "fats": 18,
                "timestamp": "2026-10-18T12:30:00.000Z", "date": "10/18/2026",
                "image": null}"#,
        )
        .unwrap();

        assert_eq!(meal.id, "1718000000000");
        assert_eq!(meal.portion, 1.0);
        assert!(meal.notes.is_none());
    }

    #[test]
    fn plan_uses_browser_field_names() {
        let plan: PlanProfile = serde_json::from_str(
            r#"{"id": "default", "name": "Balanced Diet", "calories": 2000,
                "protein": 150, "carbs": 200, "fats": 65, "active": true}"#,
        )
        .unwrap();

        assert_eq!(plan.protein_target, 150.0);
        assert!(plan.is_active);

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["calories"], 2000.0);
        assert_eq!(json["active"], true);
    }

    #[test]
    fn icons_follow_category() {
        assert_eq!(
            InsightKind::Consistency.icon(InsightCategory::Success),
            "🎯"
        );
        assert_eq!(InsightKind::Consistency.icon(InsightCategory::Alert), "📊");
        assert_eq!(InsightKind::Hydration.icon(InsightCategory::Info), "💧");
    }
}
