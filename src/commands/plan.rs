//! Plan lifecycle: create a plan with its framework, schedule and log workouts

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::CommandError;
use crate::models::{
  ExercisePrescription, ExerciseSetLog, ExperienceLevel, GoalBias, LoggedWorkout,
  PeriodizationBlock, PeriodizationFramework, RepRanges, RpeTargets, ScheduledWorkout,
};
use crate::periodization::generate_periodization_framework;

/// A stored plan header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
  pub id: i64,
  pub name: String,
  pub total_weeks: u32,
  pub experience_level: ExperienceLevel,
  pub goal_bias: GoalBias,
  pub created_at: String,
}

/// Parse a stored enum column, reporting the table it came from on failure
pub(super) fn parse_column<T>(table: &str, value: &str) -> Result<T, CommandError>
where
  T: std::str::FromStr<Err = String>,
{
  value
    .parse()
    .map_err(|e: String| CommandError::Corrupt(format!("{}: {}", table, e)))
}

/// ---------------------------------------------------------------------------
/// Plans
/// ---------------------------------------------------------------------------

/// Create a plan and persist its generated framework in one transaction
pub async fn create_plan(
  pool: &SqlitePool,
  name: &str,
  total_weeks: u32,
  experience_level: ExperienceLevel,
  goal_bias: GoalBias,
) -> Result<(i64, PeriodizationFramework), CommandError> {
  if name.trim().is_empty() {
    return Err(CommandError::InvalidInput("plan name is empty".to_string()));
  }
  if total_weeks == 0 {
    return Err(CommandError::InvalidInput(
      "total_weeks must be at least 1".to_string(),
    ));
  }

  let framework = generate_periodization_framework(total_weeks, experience_level, goal_bias);

  let mut tx = pool.begin().await?;

  let plan_id = sqlx::query(
    r#"
    INSERT INTO plans (name, total_weeks, experience_level, goal_bias)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(name.trim())
  .bind(total_weeks)
  .bind(experience_level.to_string())
  .bind(goal_bias.to_string())
  .execute(&mut *tx)
  .await?
  .last_insert_rowid();

  for block in &framework.blocks {
    sqlx::query(
      r#"
      INSERT INTO periodization_blocks (
        plan_id, block_number, block_type, start_week, end_week,
        volume_target, intensity_target, strength_rep_range, accessory_rep_range,
        strength_rpe, accessory_rpe
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
      "#,
    )
    .bind(plan_id)
    .bind(block.block_number)
    .bind(block.block_type.to_string())
    .bind(block.start_week)
    .bind(block.end_week)
    .bind(block.volume_target.to_string())
    .bind(block.intensity_target.to_string())
    .bind(&block.rep_ranges.strength)
    .bind(&block.rep_ranges.accessory)
    .bind(block.rpe_targets.strength)
    .bind(block.rpe_targets.accessory)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  info!(
    plan_id,
    total_weeks,
    blocks = framework.blocks.len(),
    "Created plan"
  );

  Ok((plan_id, framework))
}

pub async fn load_plan(pool: &SqlitePool, plan_id: i64) -> Result<PlanRecord, CommandError> {
  let row: Option<(i64, String, u32, String, String, String)> = sqlx::query_as(
    r#"
    SELECT id, name, total_weeks, experience_level, goal_bias, created_at
    FROM plans
    WHERE id = ?1
    "#,
  )
  .bind(plan_id)
  .fetch_optional(pool)
  .await?;

  let (id, name, total_weeks, level, goal, created_at) =
    row.ok_or(CommandError::PlanNotFound(plan_id))?;

  Ok(PlanRecord {
    id,
    name,
    total_weeks,
    experience_level: parse_column("plans", &level)?,
    goal_bias: parse_column("plans", &goal)?,
    created_at,
  })
}

/// Rebuild a plan's framework from its stored blocks
pub async fn load_framework(
  pool: &SqlitePool,
  plan_id: i64,
) -> Result<PeriodizationFramework, CommandError> {
  let plan = load_plan(pool, plan_id).await?;

  let rows: Vec<(u32, String, u32, u32, String, String, String, String, f64, f64)> =
    sqlx::query_as(
      r#"
      SELECT block_number, block_type, start_week, end_week,
             volume_target, intensity_target, strength_rep_range, accessory_rep_range,
             strength_rpe, accessory_rpe
      FROM periodization_blocks
      WHERE plan_id = ?1
      ORDER BY block_number
      "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await?;

  let mut blocks = Vec::with_capacity(rows.len());
  for (
    block_number,
    block_type,
    start_week,
    end_week,
    volume,
    intensity,
    strength_range,
    accessory_range,
    strength_rpe,
    accessory_rpe,
  ) in rows
  {
    blocks.push(PeriodizationBlock {
      block_number,
      block_type: parse_column("periodization_blocks", &block_type)?,
      start_week,
      end_week,
      volume_target: parse_column("periodization_blocks", &volume)?,
      intensity_target: parse_column("periodization_blocks", &intensity)?,
      rep_ranges: RepRanges {
        strength: strength_range,
        accessory: accessory_range,
      },
      rpe_targets: RpeTargets {
        strength: strength_rpe,
        accessory: accessory_rpe,
      },
    });
  }

  let framework = PeriodizationFramework {
    total_weeks: plan.total_weeks,
    blocks,
  };

  if !framework.is_gapless() {
    return Err(CommandError::Corrupt(format!(
      "plan {} blocks do not cover weeks 1-{}",
      plan_id, plan.total_weeks
    )));
  }

  Ok(framework)
}

/// ---------------------------------------------------------------------------
/// Workouts
/// ---------------------------------------------------------------------------

/// Schedule a workout with its exercise prescriptions in a plan week
pub async fn schedule_workout(
  pool: &SqlitePool,
  plan_id: i64,
  week_number: u32,
  name: &str,
  exercises: &[ExercisePrescription],
) -> Result<ScheduledWorkout, CommandError> {
  let plan = load_plan(pool, plan_id).await?;
  if week_number == 0 || week_number > plan.total_weeks {
    return Err(CommandError::WeekOutOfRange {
      plan_id,
      week_number,
      total_weeks: plan.total_weeks,
    });
  }

  let mut tx = pool.begin().await?;

  let workout_id = sqlx::query(
    "INSERT INTO scheduled_workouts (plan_id, week_number, name) VALUES (?1, ?2, ?3)",
  )
  .bind(plan_id)
  .bind(week_number)
  .bind(name)
  .execute(&mut *tx)
  .await?
  .last_insert_rowid();

  for (position, exercise) in exercises.iter().enumerate() {
    sqlx::query(
      r#"
      INSERT INTO workout_exercises (workout_id, position, exercise_id, target_sets, target_reps)
      VALUES (?1, ?2, ?3, ?4, ?5)
      "#,
    )
    .bind(workout_id)
    .bind(position as i64)
    .bind(&exercise.exercise_id)
    .bind(exercise.target_sets)
    .bind(&exercise.target_reps)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  debug!(plan_id, week_number, workout_id, "Scheduled workout");

  Ok(ScheduledWorkout {
    id: workout_id,
    plan_id,
    week_number,
    name: name.to_string(),
    exercises: exercises.to_vec(),
  })
}

/// Record a performed session against a scheduled workout
pub async fn log_workout(
  pool: &SqlitePool,
  workout_id: i64,
  completed_at: DateTime<Utc>,
  sets: &[ExerciseSetLog],
) -> Result<LoggedWorkout, CommandError> {
  let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM scheduled_workouts WHERE id = ?1")
    .bind(workout_id)
    .fetch_optional(pool)
    .await?;
  if exists.is_none() {
    return Err(CommandError::WorkoutNotFound(workout_id));
  }

  if let Some(bad) = sets.iter().find(|s| s.set.weight_kg < 0.0) {
    return Err(CommandError::InvalidInput(format!(
      "negative weight for {}",
      bad.exercise_id
    )));
  }
  if let Some(bad) = sets
    .iter()
    .find(|s| s.set.rpe.is_some_and(|rpe| !(1.0..=10.0).contains(&rpe)))
  {
    return Err(CommandError::InvalidInput(format!(
      "RPE {} for {} is outside 1-10",
      bad.set.rpe.unwrap_or_default(),
      bad.exercise_id
    )));
  }

  let mut tx = pool.begin().await?;

  let log_id = sqlx::query("INSERT INTO workout_logs (workout_id, completed_at) VALUES (?1, ?2)")
    .bind(workout_id)
    .bind(completed_at)
    .execute(&mut *tx)
    .await?
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
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  debug!(workout_id, log_id, sets = sets.len(), "Logged workout");

  Ok(LoggedWorkout {
    id: log_id,
    workout_id,
    sets: sets.to_vec(),
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
