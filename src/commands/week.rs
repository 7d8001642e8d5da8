//! Weekly review: analyze a plan week, decide progression, store next-week targets

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::plan::{load_framework, parse_column};
use super::CommandError;
use crate::analysis::{
  analyze_week_performance, calculate_week_over_week_changes, generate_progression_recommendations,
  is_week_ready_for_analysis, summarize_week_for_ai, AnalysisError,
};
use crate::config::EngineConfig;
use crate::models::{
  ExercisePrescription, ExerciseProgressionTarget, ExerciseSetLog, LoggedSet, LoggedWorkout,
  PeriodizationBlock, ProgressionRecommendation, ScheduledWorkout, WeekOverWeekChanges,
  WeekPerformanceMetrics,
};
use crate::periodization::get_current_block;
use crate::progression::calculate_exercise_progression_with;

/// Everything produced by reviewing one plan week
#[derive(Debug, Clone, Serialize)]
pub struct WeekReview {
  pub plan_id: i64,
  pub week_number: u32,
  pub block: PeriodizationBlock,
  /// Block the targets are written for; the reviewed block on the final week
  pub target_block: PeriodizationBlock,
  pub metrics: WeekPerformanceMetrics,
  pub changes: WeekOverWeekChanges,
  pub recommendation: ProgressionRecommendation,
  /// Prescriptions for week_number + 1
  pub targets: Vec<ExerciseProgressionTarget>,
  pub summary: String,
  pub reviewed_at: DateTime<Utc>,
}

/// ---------------------------------------------------------------------------
/// Loading
/// ---------------------------------------------------------------------------

/// Scheduled and logged workouts for one plan week, in insertion order
pub async fn load_week(
  pool: &SqlitePool,
  plan_id: i64,
  week_number: u32,
) -> Result<(Vec<ScheduledWorkout>, Vec<LoggedWorkout>), CommandError> {
  let workout_rows: Vec<(i64, String)> = sqlx::query_as(
    r#"
    SELECT id, name
    FROM scheduled_workouts
    WHERE plan_id = ?1 AND week_number = ?2
    ORDER BY id
    "#,
  )
  .bind(plan_id)
  .bind(week_number)
  .fetch_all(pool)
  .await?;

  let mut scheduled = Vec::with_capacity(workout_rows.len());
  for (id, name) in workout_rows {
    let exercises: Vec<(String, u32, String)> = sqlx::query_as(
      r#"
      SELECT exercise_id, target_sets, target_reps
      FROM workout_exercises
      WHERE workout_id = ?1
      ORDER BY position
      "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    scheduled.push(ScheduledWorkout {
      id,
      plan_id,
      week_number,
      name,
      exercises: exercises
        .into_iter()
        .map(|(exercise_id, target_sets, target_reps)| ExercisePrescription {
          exercise_id,
          target_sets,
          target_reps,
        })
        .collect(),
    });
  }

  let log_rows: Vec<(i64, i64)> = sqlx::query_as(
    r#"
    SELECT wl.id, wl.workout_id
    FROM workout_logs wl
    JOIN scheduled_workouts sw ON sw.id = wl.workout_id
    WHERE sw.plan_id = ?1 AND sw.week_number = ?2
    ORDER BY wl.id
    "#,
  )
  .bind(plan_id)
  .bind(week_number)
  .fetch_all(pool)
  .await?;

  let mut logged = Vec::with_capacity(log_rows.len());
  for (log_id, workout_id) in log_rows {
    let sets: Vec<(String, f64, u32, Option<f64>)> = sqlx::query_as(
      r#"
      SELECT exercise_id, weight_kg, reps, rpe
      FROM logged_sets
      WHERE log_id = ?1
      ORDER BY set_index
      "#,
    )
    .bind(log_id)
    .fetch_all(pool)
    .await?;

    logged.push(LoggedWorkout {
      id: log_id,
      workout_id,
      sets: sets
        .into_iter()
        .map(|(exercise_id, weight_kg, reps, rpe)| ExerciseSetLog {
          exercise_id,
          set: LoggedSet::new(weight_kg, reps, rpe),
        })
        .collect(),
    });
  }

  Ok((scheduled, logged))
}

/// Stored prescriptions for a plan week, ordered by exercise
pub async fn load_exercise_targets(
  pool: &SqlitePool,
  plan_id: i64,
  week_number: u32,
) -> Result<Vec<ExerciseProgressionTarget>, CommandError> {
  let rows: Vec<(String, f64, u32, Option<f64>, f64, String, f64, String, String)> =
    sqlx::query_as(
      r#"
      SELECT exercise_id, current_weight, current_reps, current_rpe,
             recommended_weight, recommended_reps, target_rpe, progression_type, notes
      FROM exercise_targets
      WHERE plan_id = ?1 AND week_number = ?2
      ORDER BY exercise_id
      "#,
    )
    .bind(plan_id)
    .bind(week_number)
    .fetch_all(pool)
    .await?;

  let mut targets = Vec::with_capacity(rows.len());
  for (
    exercise_id,
    current_weight,
    current_reps,
    current_rpe,
    recommended_weight,
    recommended_reps,
    target_rpe,
    progression_type,
    notes,
  ) in rows
  {
    targets.push(ExerciseProgressionTarget {
      exercise_id,
      current_weight,
      current_reps,
      current_rpe,
      recommended_weight,
      recommended_reps: parse_column("exercise_targets", &recommended_reps)?,
      target_rpe,
      progression_type: parse_column("exercise_targets", &progression_type)?,
      notes,
    });
  }

  Ok(targets)
}

/// ---------------------------------------------------------------------------
/// Review
/// ---------------------------------------------------------------------------

/// Group logged sets per exercise in first-logged order. Exercises that were
/// scheduled but never logged follow with no sets.
fn group_sets_by_exercise(
  scheduled: &[ScheduledWorkout],
  logged: &[LoggedWorkout],
) -> Vec<(String, Vec<LoggedSet>)> {
  let mut groups: Vec<(String, Vec<LoggedSet>)> = Vec::new();

  for entry in logged.iter().flat_map(|l| l.sets.iter()) {
    match groups.iter_mut().find(|(id, _)| *id == entry.exercise_id) {
      Some((_, sets)) => sets.push(entry.set),
      None => groups.push((entry.exercise_id.clone(), vec![entry.set])),
    }
  }

  for exercise in scheduled.iter().flat_map(|w| w.exercises.iter()) {
    if !groups.iter().any(|(id, _)| *id == exercise.exercise_id) {
      groups.push((exercise.exercise_id.clone(), Vec::new()));
    }
  }

  groups
}

/// Analyze a plan week, decide progression and persist next week's targets
pub async fn review_week(
  pool: &SqlitePool,
  config: &EngineConfig,
  plan_id: i64,
  week_number: u32,
) -> Result<WeekReview, CommandError> {
  let framework = load_framework(pool, plan_id).await?;
  let block = get_current_block(&framework, week_number)
    .cloned()
    .ok_or(CommandError::WeekOutOfRange {
      plan_id,
      week_number,
      total_weeks: framework.total_weeks,
    })?;

  let (scheduled, logged) = load_week(pool, plan_id, week_number).await?;
  let metrics = analyze_week_performance(&scheduled, &logged)?;

  if !is_week_ready_for_analysis(&metrics, config.min_completion_rate) {
    warn!(
      plan_id,
      week_number,
      completion_rate = metrics.completion_rate,
      "Week not ready for review"
    );
    return Err(CommandError::InsufficientData {
      week_number,
      completion_rate: metrics.completion_rate,
      minimum: config.min_completion_rate,
    });
  }

  // Previous week only counts when it had scheduled workouts
  let previous = if week_number > 1 {
    let (prev_scheduled, prev_logged) = load_week(pool, plan_id, week_number - 1).await?;
    match analyze_week_performance(&prev_scheduled, &prev_logged) {
      Ok(prev) => Some(prev),
      Err(AnalysisError::NoScheduledWorkouts) => None,
    }
  } else {
    None
  };

  let recommendation = generate_progression_recommendations(&metrics, previous.as_ref(), &block);
  let changes = calculate_week_over_week_changes(&metrics, previous.as_ref());

  // Targets follow the upcoming week's block so deloads land on the deload week
  let target_block = get_current_block(&framework, week_number + 1)
    .cloned()
    .unwrap_or_else(|| block.clone());

  let targets: Vec<ExerciseProgressionTarget> = group_sets_by_exercise(&scheduled, &logged)
    .iter()
    .map(|(exercise_id, sets)| {
      calculate_exercise_progression_with(
        &config.policy,
        exercise_id,
        sets,
        &target_block,
        &recommendation,
      )
    })
    .collect();

  let summary = summarize_week_for_ai(&metrics, &recommendation, week_number, block.block_type);

  let review = WeekReview {
    plan_id,
    week_number,
    block,
    target_block,
    metrics,
    changes,
    recommendation,
    targets,
    summary,
    reviewed_at: Utc::now(),
  };

  save_week_review(pool, &review).await?;

  info!(
    plan_id,
    week_number,
    decision = %review.recommendation.decision,
    targets = review.targets.len(),
    "Reviewed week"
  );

  Ok(review)
}

/// Upsert the review row and next week's targets
async fn save_week_review(pool: &SqlitePool, review: &WeekReview) -> Result<(), CommandError> {
  let recommendations_json = serde_json::to_string(&review.recommendation.recommendations)?;
  let metrics_json = serde_json::to_string(&review.metrics)?;

  let mut tx = pool.begin().await?;

  sqlx::query(
    r#"
    INSERT INTO week_reviews (
      plan_id, week_number, block_type, decision, reasoning,
      recommendations_json, confidence_score, metrics_json, summary, reviewed_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(plan_id, week_number) DO UPDATE SET
      block_type = excluded.block_type,
      decision = excluded.decision,
      reasoning = excluded.reasoning,
      recommendations_json = excluded.recommendations_json,
      confidence_score = excluded.confidence_score,
      metrics_json = excluded.metrics_json,
      summary = excluded.summary,
      reviewed_at = excluded.reviewed_at
    "#,
  )
  .bind(review.plan_id)
  .bind(review.week_number)
  .bind(review.block.block_type.to_string())
  .bind(review.recommendation.decision.to_string())
  .bind(&review.recommendation.reasoning)
  .bind(recommendations_json)
  .bind(review.recommendation.confidence_score)
  .bind(metrics_json)
  .bind(&review.summary)
  .bind(review.reviewed_at)
  .execute(&mut *tx)
  .await?;

  let target_week = review.week_number + 1;
  for target in &review.targets {
    sqlx::query(
      r#"
      INSERT INTO exercise_targets (
        plan_id, week_number, exercise_id, current_weight, current_reps, current_rpe,
        recommended_weight, recommended_reps, target_rpe, progression_type, notes, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
      ON CONFLICT(plan_id, week_number, exercise_id) DO UPDATE SET
        current_weight = excluded.current_weight,
        current_reps = excluded.current_reps,
        current_rpe = excluded.current_rpe,
        recommended_weight = excluded.recommended_weight,
        recommended_reps = excluded.recommended_reps,
        target_rpe = excluded.target_rpe,
        progression_type = excluded.progression_type,
        notes = excluded.notes,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(review.plan_id)
    .bind(target_week)
    .bind(&target.exercise_id)
    .bind(target.current_weight)
    .bind(target.current_reps)
    .bind(target.current_rpe)
    .bind(target.recommended_weight)
    .bind(target.recommended_reps.to_string())
    .bind(target.target_rpe)
    .bind(target.progression_type.to_string())
    .bind(&target.notes)
    .bind(review.reviewed_at)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  debug!(
    plan_id = review.plan_id,
    target_week,
    "Stored week review and targets"
  );

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{
    BlockType, ExperienceLevel, GoalBias, ProgressionDecision, ProgressionType, RecommendedReps,
  };
  use crate::test_utils::{
    mock_logged_workout, mock_scheduled_workout, seed_test_plan, seed_test_week, setup_test_db,
    teardown_test_db,
  };

  fn squat_and_bench(rpe: f64) -> Vec<ExerciseSetLog> {
    vec![
      ExerciseSetLog::new("squat", 100.0, 8, Some(rpe)),
      ExerciseSetLog::new("squat", 100.0, 7, Some(rpe)),
      ExerciseSetLog::new("bench", 60.0, 12, Some(rpe)),
    ]
  }

  #[test]
  fn test_group_sets_keeps_first_logged_order() {
    let scheduled = vec![mock_scheduled_workout(1, 1, 3)];
    let logged = vec![mock_logged_workout(
      10,
      1,
      vec![
        ExerciseSetLog::new("exercise_2", 40.0, 10, None),
        ExerciseSetLog::new("exercise_1", 80.0, 5, None),
        ExerciseSetLog::new("exercise_2", 42.5, 8, None),
      ],
    )];

    let groups = group_sets_by_exercise(&scheduled, &logged);
    let ids: Vec<&str> = groups.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["exercise_2", "exercise_1", "exercise_3"]);
    assert_eq!(groups[0].1.len(), 2);
    assert!(groups[2].1.is_empty());
  }

  #[tokio::test]
  async fn test_load_week_returns_scheduled_and_logged() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 8, ExperienceLevel::Beginner, GoalBias::Strength).await;
    let workout_ids = seed_test_week(&pool, plan_id, 1, 3, 2, &squat_and_bench(7.0)).await;

    let (scheduled, logged) = load_week(&pool, plan_id, 1).await.unwrap();

    assert_eq!(scheduled.len(), 3);
    assert_eq!(scheduled.iter().map(|w| w.id).collect::<Vec<_>>(), workout_ids);
    assert_eq!(scheduled[0].exercises.len(), 2);
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].sets, squat_and_bench(7.0));

    // Other weeks stay empty
    let (scheduled, logged) = load_week(&pool, plan_id, 2).await.unwrap();
    assert!(scheduled.is_empty() && logged.is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_review_week_progresses_and_stores_targets() {
    let pool = setup_test_db().await;
    let plan_id =
      seed_test_plan(&pool, 12, ExperienceLevel::Intermediate, GoalBias::Strength).await;
    seed_test_week(&pool, plan_id, 1, 4, 4, &squat_and_bench(6.0)).await;

    let review = review_week(&pool, &EngineConfig::default(), plan_id, 1)
      .await
      .expect("review should succeed");

    // Accumulation targets RPE 7.5; 6.0 at full completion is a clear progress week
    assert_eq!(review.block.block_type, BlockType::Accumulation);
    assert_eq!(review.metrics.completion_rate, 100.0);
    assert_eq!(review.recommendation.decision, ProgressionDecision::Progress);
    assert_eq!(review.changes, WeekOverWeekChanges::default());
    assert!(review.summary.starts_with("Week 1 (accumulation phase)"));

    let squat = &review.targets[0];
    assert_eq!(squat.exercise_id, "squat");
    assert_eq!(squat.recommended_weight, 100.0);
    assert_eq!(squat.recommended_reps, RecommendedReps::Exact(9));

    let bench = &review.targets[1];
    assert_eq!(bench.exercise_id, "bench");
    assert_eq!(bench.recommended_weight, 62.5);
    assert_eq!(bench.recommended_reps, RecommendedReps::Exact(8));
    assert_eq!(bench.progression_type, ProgressionType::Increase);

    // Targets land on the following week
    let stored = load_exercise_targets(&pool, plan_id, 2).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], review.targets[1]);
    assert_eq!(stored[1], review.targets[0]);
    assert!(load_exercise_targets(&pool, plan_id, 1).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_review_week_compares_previous_week() {
    let pool = setup_test_db().await;
    let plan_id =
      seed_test_plan(&pool, 12, ExperienceLevel::Intermediate, GoalBias::Strength).await;
    seed_test_week(&pool, plan_id, 1, 4, 4, &squat_and_bench(7.5)).await;
    seed_test_week(&pool, plan_id, 2, 4, 3, &squat_and_bench(7.5)).await;

    let review = review_week(&pool, &EngineConfig::default(), plan_id, 2)
      .await
      .unwrap();

    assert_eq!(review.changes.completion_rate_change, -25.0);
    assert_eq!(review.changes.volume_change_pct, -25.0);
    // 75% completion sits in the moderate band
    assert_eq!(review.recommendation.decision, ProgressionDecision::Maintain);
    assert_eq!(review.recommendation.confidence_score, 0.7);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_review_week_is_idempotent() {
    let pool = setup_test_db().await;
    let plan_id =
      seed_test_plan(&pool, 12, ExperienceLevel::Intermediate, GoalBias::Strength).await;
    seed_test_week(&pool, plan_id, 1, 2, 2, &squat_and_bench(7.5)).await;

    let config = EngineConfig::default();
    review_week(&pool, &config, plan_id, 1).await.unwrap();
    review_week(&pool, &config, plan_id, 1).await.unwrap();

    let reviews: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM week_reviews WHERE plan_id = ?1")
      .bind(plan_id)
      .fetch_one(&pool)
      .await
      .unwrap();
    let targets: i64 =
      sqlx::query_scalar("SELECT COUNT(*) FROM exercise_targets WHERE plan_id = ?1")
        .bind(plan_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(reviews, 1);
    assert_eq!(targets, 2);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_review_week_rejects_incomplete_week() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 8, ExperienceLevel::Beginner, GoalBias::Balanced).await;
    seed_test_week(&pool, plan_id, 1, 4, 1, &squat_and_bench(7.0)).await;

    let result = review_week(&pool, &EngineConfig::default(), plan_id, 1).await;
    assert!(matches!(
      result,
      Err(CommandError::InsufficientData {
        week_number: 1,
        ..
      })
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_review_week_errors() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 4, ExperienceLevel::Beginner, GoalBias::Balanced).await;
    let config = EngineConfig::default();

    let out_of_range = review_week(&pool, &config, plan_id, 5).await;
    assert!(matches!(
      out_of_range,
      Err(CommandError::WeekOutOfRange { total_weeks: 4, .. })
    ));

    let unscheduled = review_week(&pool, &config, plan_id, 1).await;
    assert!(matches!(
      unscheduled,
      Err(CommandError::Analysis(AnalysisError::NoScheduledWorkouts))
    ));

    let missing = review_week(&pool, &config, plan_id + 1, 1).await;
    assert!(matches!(missing, Err(CommandError::PlanNotFound(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_week_before_deload_gets_deload_targets() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 8, ExperienceLevel::Beginner, GoalBias::Strength).await;
    seed_test_week(&pool, plan_id, 3, 2, 2, &squat_and_bench(6.0)).await;

    let review = review_week(&pool, &EngineConfig::default(), plan_id, 3)
      .await
      .unwrap();

    // Decision is made against the reviewed block, loads against the next one
    assert_eq!(review.block.block_type, BlockType::Accumulation);
    assert_eq!(review.target_block.block_type, BlockType::Deload);
    assert!(review
      .targets
      .iter()
      .all(|t| t.progression_type == ProgressionType::Decrease));
    assert!(review.targets.iter().all(|t| t.notes.starts_with("Deload week")));

    let stored = load_exercise_targets(&pool, plan_id, 4).await.unwrap();
    let squat = stored.iter().find(|t| t.exercise_id == "squat").unwrap();
    assert_eq!(squat.recommended_weight, 85.0);
    assert_eq!(squat.recommended_reps, RecommendedReps::Range("6-8".to_string()));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_week_after_deload_returns_to_normal_loads() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 8, ExperienceLevel::Beginner, GoalBias::Strength).await;
    seed_test_week(&pool, plan_id, 4, 2, 2, &squat_and_bench(6.0)).await;

    let review = review_week(&pool, &EngineConfig::default(), plan_id, 4)
      .await
      .unwrap();

    assert_eq!(review.block.block_type, BlockType::Deload);
    assert_eq!(review.target_block.block_type, BlockType::Accumulation);
    assert_eq!(review.recommendation.decision, ProgressionDecision::Maintain);

    let stored = load_exercise_targets(&pool, plan_id, 5).await.unwrap();
    let squat = stored.iter().find(|t| t.exercise_id == "squat").unwrap();
    assert_eq!(squat.recommended_weight, 100.0);
    assert_eq!(squat.progression_type, ProgressionType::Maintain);
    assert!(!squat.notes.contains("Deload"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_final_week_targets_use_reviewed_block() {
    let pool = setup_test_db().await;
    let plan_id = seed_test_plan(&pool, 4, ExperienceLevel::Beginner, GoalBias::Strength).await;
    seed_test_week(&pool, plan_id, 4, 2, 2, &squat_and_bench(6.0)).await;

    let review = review_week(&pool, &EngineConfig::default(), plan_id, 4)
      .await
      .unwrap();

    assert_eq!(review.target_block, review.block);
    assert_eq!(review.targets[0].recommended_weight, 85.0);

    teardown_test_db(pool).await;
  }
}
