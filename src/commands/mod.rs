pub mod plan;
pub mod week;

use serde::Serialize;

use crate::analysis::AnalysisError;

pub use plan::{
  create_plan, load_framework, load_plan, log_workout, schedule_workout, PlanRecord,
};
pub use week::{load_exercise_targets, load_week, review_week, WeekReview};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Analysis error: {0}")]
  Analysis(#[from] AnalysisError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Plan {0} not found")]
  PlanNotFound(i64),

  #[error("Scheduled workout {0} not found")]
  WorkoutNotFound(i64),

  #[error("Week {week_number} is outside plan {plan_id} ({total_weeks} weeks)")]
  WeekOutOfRange {
    plan_id: i64,
    week_number: u32,
    total_weeks: u32,
  },

  #[error(
    "Week {week_number} is {completion_rate:.0}% complete, need at least {minimum:.0}% for a review"
  )]
  InsufficientData {
    week_number: u32,
    completion_rate: f64,
    minimum: f64,
  },

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Corrupt record: {0}")]
  Corrupt(String),
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}
