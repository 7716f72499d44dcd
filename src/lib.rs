//! CaloCount analytics
//!
//! Trend aggregation, heuristic insights and a linear-regression calorie
//! forecast over a single-user meal ledger, plus the JSON state store and
//! report rendering used by the `calocount` binary.

pub mod error;
pub mod forecast;
pub mod insights;
pub mod models;
pub mod progress;
pub mod report;
pub mod session;
pub mod store;
pub mod trends;

pub use error::{Error, Result};
pub use models::{
    AnalyticsSnapshot, DailyBucket, Insight, InsightCategory, InsightKind, MealRecord,
    PlanProfile, Prediction, WeeklyBucket,
};
pub use session::AnalyticsSession;
