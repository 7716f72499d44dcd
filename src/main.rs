use std::path::PathBuf;

use anyhow::Context;
use calocount_analytics::models::PlanProfile;
use calocount_analytics::progress::{self, HistoryFilter};
use calocount_analytics::session::{active_plan, AnalyticsSession};
use calocount_analytics::store::{self, AppState, MealEntry, UserProfile};
use calocount_analytics::report;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const STATE_ENV: &str = "CALOCOUNT_STATE";
const DEFAULT_STATE_FILE: &str = "calocount-state.json";

#[derive(Parser)]
#[command(name = "calocount")]
#[command(about = "Nutrition trends, insights and calorie forecasts", long_about = None)]
struct Cli {
    /// State file (defaults to $CALOCOUNT_STATE, then ./calocount-state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute trends, insights and the 7-day forecast
    Analyze {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Import meals from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Load two weeks of demo meals
    Seed,
    /// Log a meal
    Log {
        #[arg(long)]
        name: String,
        #[arg(long)]
        calories: f64,
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long, default_value_t = 0.0)]
        fats: f64,
        #[arg(long, default_value_t = 1.0)]
        portion: f64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a meal by id
    DeleteMeal {
        #[arg(long)]
        id: String,
    },
    /// Remove every meal logged today
    ClearToday,
    /// Show today's progress against the active plan
    Today,
    /// List logged meals
    History {
        /// today, week, month or all
        #[arg(long, default_value = "all")]
        filter: HistoryFilter,
    },
    /// List nutrition plans
    Plans,
    /// Create a nutrition plan
    CreatePlan {
        #[arg(long)]
        name: String,
        #[arg(long)]
        calories: f64,
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long, default_value_t = 0.0)]
        fats: f64,
    },
    /// Make a plan the active one
    SelectPlan {
        #[arg(long)]
        id: String,
    },
    /// Delete a plan
    DeletePlan {
        #[arg(long)]
        id: String,
    },
    /// Show or update the user profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        age: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
        /// lose, maintain or gain
        #[arg(long)]
        goal: Option<String>,
    },
    /// Show ledger statistics
    Stats,
}

fn state_path(cli: &Cli) -> PathBuf {
    cli.state
        .clone()
        .or_else(|| std::env::var(STATE_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let path = state_path(&cli);
    let mut state = store::load_state(&path)
        .with_context(|| format!("failed to load state from {}", path.display()))?;
    let now = Local::now();

    match cli.command {
        Commands::Analyze { json } => {
            let session = AnalyticsSession::new();
            let snapshot = session.refresh(&state.meals, &state.plans, &now);

            if json {
                println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
                return Ok(());
            }

            println!("Insights:");
            for insight in snapshot.insights.iter() {
                println!(
                    "- {} {} [{} {}] {}",
                    insight.icon(),
                    insight.title,
                    insight.category,
                    insight.score,
                    insight.message
                );
            }

            if snapshot.predictions.is_empty() {
                println!("Not enough data for a forecast yet.");
                return Ok(());
            }

            println!("Forecast:");
            for prediction in snapshot.predictions.iter() {
                println!(
                    "- {}: {} kcal ({}% confidence)",
                    prediction.date, prediction.predicted_calories, prediction.confidence_percent
                );
            }
        }
        Commands::Report { out } => {
            let session = AnalyticsSession::new();
            let snapshot = session.refresh(&state.meals, &state.plans, &now);
            let plan = active_plan(&state.plans);
            let today = plan.map(|plan| progress::daily_progress(&state.meals, plan, &now));

            let report = report::build_report(&snapshot, &state.meals, plan, today.as_ref());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let inserted = store::import_csv(&mut state, &csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            store::save_state(&path, &state)?;
            println!("Inserted {inserted} meals from {}.", csv.display());
        }
        Commands::Seed => {
            let inserted = store::seed_demo(&mut state, &now)?;
            store::save_state(&path, &state)?;
            println!("Seeded {inserted} demo meals.");
        }
        Commands::Log {
            name,
            calories,
            protein,
            carbs,
            fats,
            portion,
            notes,
        } => {
            let entry = MealEntry {
                name,
                calories,
                protein,
                carbs,
                fats,
                portion,
                notes,
            };
            let meal = store::log_meal(&mut state, entry, Utc::now())?;
            store::save_state(&path, &state)?;
            println!("Logged {} ({:.0} kcal) as {}.", meal.name, meal.calories, meal.id);
        }
        Commands::DeleteMeal { id } => {
            let meal = store::delete_meal(&mut state, &id)?;
            store::save_state(&path, &state)?;
            println!("Deleted {}.", meal.name);
        }
        Commands::ClearToday => {
            let removed = store::clear_today(&mut state, &now);
            store::save_state(&path, &state)?;
            println!("Cleared {removed} meals from today.");
        }
        Commands::Today => print_today(&state, &now),
        Commands::History { filter } => {
            let meals = progress::filter_history(&state.meals, filter, &now);

            if meals.is_empty() {
                println!("No meals found for this period.");
                return Ok(());
            }

            for meal in meals {
                let local = meal.timestamp.with_timezone(&Local);
                println!(
                    "- {} {} {} ({:.0} kcal, {:.0}g protein) [{}]",
                    local.date_naive(),
                    local.format("%H:%M"),
                    meal.name,
                    meal.calories,
                    meal.protein,
                    meal.id
                );
            }
        }
        Commands::Plans => {
            if state.plans.is_empty() {
                println!("No nutrition plans yet.");
            }
            for plan in state.plans.iter() {
                println!(
                    "{} {} [{}]: {:.0} kcal, {:.0}g protein, {:.0}g carbs, {:.0}g fats",
                    if plan.is_active { "*" } else { " " },
                    plan.name,
                    plan.id,
                    plan.calories_target,
                    plan.protein_target,
                    plan.carbs_target,
                    plan.fats_target
                );
            }
        }
        Commands::CreatePlan {
            name,
            calories,
            protein,
            carbs,
            fats,
        } => {
            let plan = PlanProfile {
                id: uuid::Uuid::new_v4().to_string(),
                name,
                calories_target: calories,
                protein_target: protein,
                carbs_target: carbs,
                fats_target: fats,
                is_active: false,
            };
            let id = plan.id.clone();
            store::add_plan(&mut state, plan)?;
            store::save_state(&path, &state)?;
            println!("Created plan {id}.");
        }
        Commands::SelectPlan { id } => {
            store::select_plan(&mut state, &id)?;
            store::save_state(&path, &state)?;
            println!("Plan {id} is now active.");
        }
        Commands::DeletePlan { id } => {
            let plan = store::delete_plan(&mut state, &id)?;
            store::save_state(&path, &state)?;
            println!("Deleted plan {}.", plan.name);
        }
        Commands::Profile {
            name,
            email,
            age,
            weight,
            goal,
        } => {
            let changed = name.is_some()
                || email.is_some()
                || age.is_some()
                || weight.is_some()
                || goal.is_some();

            if changed {
                let current = state.user.clone();
                let profile = UserProfile {
                    name: name.unwrap_or(current.name),
                    email: email.unwrap_or(current.email),
                    age: age.or(current.age),
                    weight: weight.or(current.weight),
                    goal: goal.unwrap_or(current.goal),
                };
                store::update_profile(&mut state, profile);
                store::save_state(&path, &state)?;
                println!("Profile updated.");
            }

            let user = &state.user;
            println!("{} <{}>", user.name, user.email);
            if let Some(age) = user.age {
                println!("Age: {age}");
            }
            if let Some(weight) = user.weight {
                println!("Weight: {weight}");
            }
            println!("Goal: {}", user.goal);
        }
        Commands::Stats => {
            let stats = progress::ledger_stats(&state.meals, &state.plans);
            println!("Total meals: {}", stats.meal_count);
            println!("Total plans: {}", stats.plan_count);
            println!(
                "Active plan: {}",
                stats.active_plan.as_deref().unwrap_or("None")
            );
            if let Some(avg) = stats.avg_calories_per_meal {
                println!("Average calories per meal: {avg:.0}");
            }
        }
    }

    Ok(())
}

fn print_today(state: &AppState, now: &chrono::DateTime<Local>) {
    let Some(plan) = active_plan(&state.plans) else {
        println!("No nutrition plan configured.");
        return;
    };

    let today = progress::daily_progress(&state.meals, plan, now);
    println!("{} ({} meals today)", plan.name, today.meal_count);

    for (label, unit, nutrient) in [
        ("Calories", " kcal", today.calories),
        ("Protein", "g", today.protein),
        ("Carbs", "g", today.carbs),
        ("Fats", "g", today.fats),
    ] {
        let status = if nutrient.remaining > 0.0 {
            format!("{:.0}{unit} remaining", nutrient.remaining)
        } else {
            format!("{:.0}{unit} over target", nutrient.remaining.abs())
        };
        println!(
            "- {label}: {:.0} / {:.0}{unit} ({:.0}%) {status}",
            nutrient.consumed, nutrient.target, nutrient.percent
        );
    }
}
