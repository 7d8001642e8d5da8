//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seeded plans and weeks
//! - Mock data factories
//! - Helper assertions

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::commands::create_plan;
use crate::models::{
  ExercisePrescription, ExerciseSetLog, ExperienceLevel, GoalBias, LoggedWorkout,
  ProgressionDecision, ProgressionRecommendation, ScheduledWorkout, WeekPerformanceMetrics,
};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed a plan along with its generated framework
/// Returns the plan ID
pub async fn seed_test_plan(
  pool: &SqlitePool,
  total_weeks: u32,
  level: ExperienceLevel,
  goal: GoalBias,
) -> i64 {
  let (plan_id, _) = create_plan(pool, "Test plan", total_weeks, level, goal)
    .await
    .expect("Failed to seed test plan");
  plan_id
}

/// Seed one plan week: `scheduled` workouts prescribing every exercise in
/// `sets`, of which the first `logged` are logged once with `sets`
/// Returns the IDs of the scheduled workouts
pub async fn seed_test_week(
  pool: &SqlitePool,
  plan_id: i64,
  week_number: u32,
  scheduled: usize,
  logged: usize,
  sets: &[ExerciseSetLog],
) -> Vec<i64> {
  let mut seen = BTreeSet::new();
  let exercise_ids: Vec<&str> = sets
    .iter()
    .map(|s| s.exercise_id.as_str())
    .filter(|id| seen.insert(*id))
    .collect();

  let mut workout_ids = Vec::new();

  for i in 0..scheduled {
    let workout_id = sqlx::query(
      "INSERT INTO scheduled_workouts (plan_id, week_number, name) VALUES (?1, ?2, ?3)",
    )
    .bind(plan_id)
    .bind(week_number)
    .bind(format!("Session {}", i + 1))
    .execute(pool)
    .await
    .expect("Failed to insert scheduled workout")
    .last_insert_rowid();

    for (position, exercise_id) in exercise_ids.iter().enumerate() {
      sqlx::query(
        r#"
        INSERT INTO workout_exercises (workout_id, position, exercise_id, target_sets, target_reps)
        VALUES (?1, ?2, ?3, 3, '8-12')
        "#,
      )
      .bind(workout_id)
      .bind(position as i64)
      .bind(*exercise_id)
      .execute(pool)
      .await
      .expect("Failed to insert workout exercise");
    }

    workout_ids.push(workout_id);
  }

  for (i, workout_id) in workout_ids.iter().take(logged).enumerate() {
    let log_id = sqlx::query("INSERT INTO workout_logs (workout_id, completed_at) VALUES (?1, ?2)")
      .bind(workout_id)
      .bind(datetime_days_ago((scheduled - i) as i64))
      .execute(pool)
      .await
      .expect("Failed to insert workout log")
      .last_insert_rowid();

    for (set_index, entry) in sets.iter().enumerate() {
      sqlx::query(
        r#"
        INSERT INTO logged_sets (log_id, set_index, exercise_id, weight_kg, reps, rpe)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
      )
      .bind(log_id)
      .bind(set_index as i64)
      .bind(&entry.exercise_id)
      .bind(entry.set.weight_kg)
      .bind(entry.set.reps)
      .bind(entry.set.rpe)
      .execute(pool)
      .await
      .expect("Failed to insert logged set");
    }
  }

  workout_ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Scheduled workout in plan 1 prescribing `exercise_1`..`exercise_N`
pub fn mock_scheduled_workout(id: i64, week_number: u32, exercise_count: usize) -> ScheduledWorkout {
  ScheduledWorkout {
    id,
    plan_id: 1,
    week_number,
    name: format!("Workout {}", id),
    exercises: (1..=exercise_count)
      .map(|n| ExercisePrescription {
        exercise_id: format!("exercise_{}", n),
        target_sets: 3,
        target_reps: "8-12".to_string(),
      })
      .collect(),
  }
}

pub fn mock_logged_workout(id: i64, workout_id: i64, sets: Vec<ExerciseSetLog>) -> LoggedWorkout {
  LoggedWorkout {
    id,
    workout_id,
    sets,
  }
}

/// Week metrics with a fixed volume and tonnage
pub fn mock_week_metrics(completion_rate: f64, avg_rpe: f64) -> WeekPerformanceMetrics {
  WeekPerformanceMetrics {
    completion_rate,
    avg_rpe,
    total_volume: 200,
    total_tonnage: 15000.0,
    exercise_breakdown: Default::default(),
  }
}

pub fn mock_recommendation(decision: ProgressionDecision) -> ProgressionRecommendation {
  ProgressionRecommendation {
    decision,
    reasoning: "test".to_string(),
    recommendations: vec![],
    confidence_score: 0.8,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      r#"
      SELECT name FROM sqlite_master
      WHERE type='table' AND name IN (
        'plans', 'periodization_blocks', 'scheduled_workouts', 'workout_exercises',
        'workout_logs', 'logged_sets', 'week_reviews', 'exercise_targets'
      )
      "#,
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 8, "Expected 8 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_week_returns_correct_counts() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 4, ExperienceLevel::Beginner, GoalBias::Balanced).await;

    let sets = vec![
      ExerciseSetLog::new("squat", 100.0, 5, Some(8.0)),
      ExerciseSetLog::new("squat", 100.0, 5, Some(8.5)),
    ];
    let ids = seed_test_week(&pool, plan_id, 1, 3, 2, &sets).await;
    assert_eq!(ids.len(), 3);

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_logs")
      .fetch_one(&pool)
      .await
      .expect("Failed to count logs");
    let logged_sets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logged_sets")
      .fetch_one(&pool)
      .await
      .expect("Failed to count sets");
    let prescriptions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_exercises")
      .fetch_one(&pool)
      .await
      .expect("Failed to count prescriptions");

    assert_eq!(logs, 2);
    assert_eq!(logged_sets, 4);
    assert_eq!(prescriptions, 3);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let workout = mock_scheduled_workout(3, 2, 2);
    assert_eq!(workout.id, 3);
    assert_eq!(workout.week_number, 2);
    assert_eq!(workout.exercises[1].exercise_id, "exercise_2");

    let logged = mock_logged_workout(9, 3, vec![ExerciseSetLog::new("squat", 80.0, 5, None)]);
    assert_eq!(logged.workout_id, 3);
    assert_eq!(logged.sets.len(), 1);

    let metrics = mock_week_metrics(90.0, 7.0);
    assert_eq!(metrics.total_volume, 200);

    let rec = mock_recommendation(ProgressionDecision::Regress);
    assert!(rec.should_regress());
  }

  #[test]
  fn test_assert_approx_eq_macro() {
    assert_approx_eq!(0.1_f64 + 0.2, 0.3, 1e-9);
    assert_approx_eq!(133.333_f64, 133.33, 0.01);
  }
}
