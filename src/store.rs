//! Persistence for the CaloCount state blob
//!
//! The whole ledger lives in one JSON document with the same shape the
//! browser app kept in local storage: `{ meals, plans, user, theme }`.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{MealRecord, PlanProfile};
use crate::trends::local_date;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredState")]
pub struct AppState {
    pub meals: Vec<MealRecord>,
    pub plans: Vec<PlanProfile>,
    pub user: UserProfile,
    pub theme: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            meals: Vec::new(),
            plans: default_plans(),
            user: default_user(),
            theme: default_theme(),
        }
    }
}

// On-disk shape. The browser app wrote `null` for cleared values and fell
// back to its defaults on load, so every top-level field is optional here.
#[derive(Deserialize)]
struct StoredState {
    #[serde(default)]
    meals: Option<Vec<MealRecord>>,
    #[serde(default)]
    plans: Option<Vec<PlanProfile>>,
    #[serde(default)]
    user: Option<UserProfile>,
    #[serde(default)]
    theme: Option<String>,
}

impl From<StoredState> for AppState {
    fn from(stored: StoredState) -> Self {
        Self {
            meals: stored.meals.unwrap_or_default(),
            plans: stored.plans.unwrap_or_else(default_plans),
            user: stored.user.unwrap_or_else(default_user),
            theme: stored
                .theme
                .filter(|theme| !theme.is_empty())
                .unwrap_or_else(default_theme),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub age: Option<f64>,
    pub weight: Option<f64>,
    pub goal: String,
}

/// A manually entered meal before it is stamped and scaled by portion.
#[derive(Debug, Clone, PartialEq)]
pub struct MealEntry {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub portion: f64,
    pub notes: Option<String>,
}

impl MealEntry {
    pub fn into_record(self, id: String, timestamp: DateTime<Utc>) -> MealRecord {
        let portion = if self.portion > 0.0 { self.portion } else { 1.0 };
        MealRecord {
            id,
            name: self.name,
            timestamp,
            calories: self.calories * portion,
            protein: self.protein * portion,
            carbs: self.carbs * portion,
            fats: self.fats * portion,
            portion,
            notes: self.notes.filter(|notes| !notes.trim().is_empty()),
        }
    }
}

pub fn default_plans() -> Vec<PlanProfile> {
    vec![PlanProfile {
        id: "default".to_string(),
        name: "Balanced Diet".to_string(),
        calories_target: 2000.0,
        protein_target: 150.0,
        carbs_target: 200.0,
        fats_target: 65.0,
        is_active: true,
    }]
}

pub fn default_user() -> UserProfile {
    UserProfile {
        name: "Alex Johnson".to_string(),
        email: "alex@example.com".to_string(),
        age: None,
        weight: None,
        goal: "maintain".to_string(),
    }
}

fn default_theme() -> String {
    "light".to_string()
}

/// Loads the state blob. A missing file yields the default state.
pub fn load_state(path: &Path) -> Result<AppState> {
    if !path.exists() {
        info!(path = %path.display(), "No saved state, starting fresh");
        return Ok(AppState::default());
    }

    let raw = std::fs::read_to_string(path)?;
    let state: AppState = serde_json::from_str(&raw)?;
    Ok(state)
}

/// Writes the state through a temp file in the same directory, then renames
/// it over `path`.
pub fn save_state(path: &Path, state: &AppState) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, state)?;
    file.write_all(b"\n")?;
    file.persist(path).map_err(|err| Error::Io(err.error))?;

    info!(
        path = %path.display(),
        meals = state.meals.len(),
        plans = state.plans.len(),
        "Saved state"
    );
    Ok(())
}

pub fn validate_meal(meal: &MealRecord) -> Result<()> {
    if meal.name.trim().is_empty() || meal.calories <= 0.0 {
        return Err(Error::InvalidData(
            "meal needs a name and a positive calorie count".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_plan(plan: &PlanProfile) -> Result<()> {
    if plan.name.trim().is_empty() || plan.calories_target <= 0.0 {
        return Err(Error::InvalidData(
            "plan needs a name and a positive calorie target".to_string(),
        ));
    }
    Ok(())
}

/// Inserts a meal keeping the ledger in timestamp order. Returns `false`
/// when a meal with the same id already exists.
pub fn insert_meal(state: &mut AppState, meal: MealRecord) -> Result<bool> {
    validate_meal(&meal)?;
    if state.meals.iter().any(|existing| existing.id == meal.id) {
        return Ok(false);
    }

    let position = state
        .meals
        .partition_point(|existing| existing.timestamp <= meal.timestamp);
    state.meals.insert(position, meal);
    Ok(true)
}

pub fn log_meal(state: &mut AppState, entry: MealEntry, now: DateTime<Utc>) -> Result<MealRecord> {
    let meal = entry.into_record(Uuid::new_v4().to_string(), now);
    insert_meal(state, meal.clone())?;
    Ok(meal)
}

pub fn delete_meal(state: &mut AppState, id: &str) -> Result<MealRecord> {
    let index = state
        .meals
        .iter()
        .position(|meal| meal.id == id)
        .ok_or_else(|| Error::NotFound(format!("meal {}", id)))?;
    Ok(state.meals.remove(index))
}

/// Removes every meal logged on `now`'s local calendar date.
pub fn clear_today<Tz: TimeZone>(state: &mut AppState, now: &DateTime<Tz>) -> usize {
    let tz = now.timezone();
    let today = now.date_naive();
    let before = state.meals.len();

    state
        .meals
        .retain(|meal| local_date(&meal.timestamp, &tz) != today);

    let removed = before - state.meals.len();
    info!(removed, "Cleared today's meals");
    removed
}

/// Replaces the stored profile. Blank text is trimmed and non-positive
/// age or weight is treated as unset.
pub fn update_profile(state: &mut AppState, profile: UserProfile) {
    state.user = UserProfile {
        name: profile.name.trim().to_string(),
        email: profile.email.trim().to_string(),
        age: profile.age.filter(|age| *age > 0.0),
        weight: profile.weight.filter(|weight| *weight > 0.0),
        goal: profile.goal,
    };
}

pub fn add_plan(state: &mut AppState, plan: PlanProfile) -> Result<()> {
    validate_plan(&plan)?;
    if state.plans.iter().any(|existing| existing.id == plan.id) {
        return Err(Error::InvalidData(format!("plan {} already exists", plan.id)));
    }
    state.plans.push(plan);
    Ok(())
}

/// Marks `id` as the only active plan.
pub fn select_plan(state: &mut AppState, id: &str) -> Result<()> {
    if !state.plans.iter().any(|plan| plan.id == id) {
        return Err(Error::NotFound(format!("plan {}", id)));
    }

    for plan in state.plans.iter_mut() {
        plan.is_active = plan.id == id;
    }
    Ok(())
}

/// Removes a plan. If it was active, the first remaining plan takes over.
pub fn delete_plan(state: &mut AppState, id: &str) -> Result<PlanProfile> {
    let index = state
        .plans
        .iter()
        .position(|plan| plan.id == id)
        .ok_or_else(|| Error::NotFound(format!("plan {}", id)))?;
    let removed = state.plans.remove(index);

    if removed.is_active {
        if let Some(first) = state.plans.first_mut() {
            first.is_active = true;
        }
    }
    Ok(removed)
}

/// Imports meals from a CSV file with a header row. Rows without an id get
/// a generated one; rows whose id is already in the ledger are skipped.
/// The whole file is parsed before anything is inserted, so a malformed
/// row leaves `state` untouched.
pub fn import_csv(state: &mut AppState, csv_path: &Path) -> Result<usize> {
    #[derive(Deserialize)]
    struct CsvRow {
        name: String,
        calories: f64,
        #[serde(default)]
        protein: f64,
        #[serde(default)]
        carbs: f64,
        #[serde(default)]
        fats: f64,
        timestamp: DateTime<Utc>,
        portion: Option<f64>,
        notes: Option<String>,
        id: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let rows = reader
        .deserialize::<CsvRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut inserted = 0usize;

    for (line, row) in rows.into_iter().enumerate() {
        let id = row
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let entry = MealEntry {
            name: row.name,
            calories: row.calories,
            protein: row.protein,
            carbs: row.carbs,
            fats: row.fats,
            portion: row.portion.unwrap_or(1.0),
            notes: row.notes,
        };

        match insert_meal(state, entry.into_record(id, row.timestamp)) {
            Ok(true) => inserted += 1,
            Ok(false) => {}
            Err(err) => warn!(row = line + 2, error = %err, "Skipping CSV row"),
        }
    }

    info!(inserted, path = %csv_path.display(), "Imported meals");
    Ok(inserted)
}

// (name, calories, protein, carbs, fats)
const DEMO_TEMPLATES: [(&str, f64, f64, f64, f64); 8] = [
    ("Breakfast Oatmeal", 320.0, 12.0, 45.0, 8.0),
    ("Chicken Salad", 450.0, 38.0, 32.0, 18.0),
    ("Salmon with Rice", 580.0, 42.0, 58.0, 16.0),
    ("Greek Yogurt Bowl", 280.0, 24.0, 28.0, 8.0),
    ("Turkey Sandwich", 420.0, 32.0, 46.0, 12.0),
    ("Protein Smoothie", 340.0, 28.0, 38.0, 8.0),
    ("Grilled Steak", 520.0, 48.0, 12.0, 28.0),
    ("Veggie Stir Fry", 380.0, 18.0, 48.0, 14.0),
];

// Fixed ±20% cycle so seeding is reproducible.
const DEMO_VARIANCE: [f64; 7] = [0.8, 1.1, 0.95, 1.2, 0.9, 1.05, 1.0];
const DEMO_MEAL_HOURS: [u32; 4] = [8, 12, 18, 21];
pub const DEMO_DAYS: i64 = 14;

/// Adds two to four demo meals per day for the last two weeks. Meals that
/// would land after `now` are left out, and re-seeding is a no-op.
pub fn seed_demo<Tz: TimeZone>(state: &mut AppState, now: &DateTime<Tz>) -> Result<usize> {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let mut inserted = 0usize;

    for days_ago in (0..DEMO_DAYS).rev() {
        let date = now.date_naive() - Duration::days(days_ago);
        let meals_per_day = 2 + (days_ago as usize % 3);

        for slot in 0..meals_per_day {
            let (name, calories, protein, carbs, fats) =
                DEMO_TEMPLATES[(days_ago as usize * 3 + slot) % DEMO_TEMPLATES.len()];
            let variance = DEMO_VARIANCE[(days_ago as usize + slot) % DEMO_VARIANCE.len()];

            let Some(local) = date.and_hms_opt(DEMO_MEAL_HOURS[slot], 0, 0) else {
                continue;
            };
            let Some(timestamp) = tz.from_local_datetime(&local).earliest() else {
                continue;
            };
            let timestamp = timestamp.with_timezone(&Utc);
            if timestamp > now_utc {
                continue;
            }

            let meal = MealRecord {
                id: format!("demo-{}-{}", date, slot),
                name: name.to_string(),
                timestamp,
                calories: (calories * variance).round(),
                protein: (protein * variance).round(),
                carbs: (carbs * variance).round(),
                fats: (fats * variance).round(),
                portion: 1.0,
                notes: Some("Demo meal".to_string()),
            };

            if insert_meal(state, meal)? {
                inserted += 1;
            }
        }
    }

    info!(inserted, "Seeded demo meals");
    Ok(inserted)
}
