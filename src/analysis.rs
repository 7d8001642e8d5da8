//! Deterministic analysis layer for weekly training performance
//!
//! This module turns a week's scheduled workouts and logged sets into metrics,
//! then combines them with the active periodization block to decide whether the
//! athlete should progress, maintain or regress. The coach-brief text generator
//! only ever sees the pre-computed result via `summarize_week_for_ai`.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{
  BlockType, ExerciseBreakdown, LoggedWorkout, PeriodizationBlock, ProgressionDecision,
  ProgressionRecommendation, ScheduledWorkout, WeekOverWeekChanges, WeekPerformanceMetrics,
};
use crate::progression::round2;

/// Default gate for `is_week_ready_for_analysis`
pub const DEFAULT_MINIMUM_COMPLETION_RATE: f64 = 50.0;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
  #[error("No scheduled workouts to analyze")]
  NoScheduledWorkouts,
}

impl Serialize for AnalysisError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Week Metrics
/// ---------------------------------------------------------------------------

/// Aggregate one week of logged sets against the workouts scheduled for it
pub fn analyze_week_performance(
  scheduled_workouts: &[ScheduledWorkout],
  logged_workouts: &[LoggedWorkout],
) -> Result<WeekPerformanceMetrics, AnalysisError> {
  if scheduled_workouts.is_empty() {
    return Err(AnalysisError::NoScheduledWorkouts);
  }

  // Completion: distinct scheduled workouts that have at least one log
  let scheduled_ids: HashSet<i64> = scheduled_workouts.iter().map(|w| w.id).collect();
  let completed_ids: HashSet<i64> = logged_workouts
    .iter()
    .map(|l| l.workout_id)
    .filter(|id| scheduled_ids.contains(id))
    .collect();
  let completion_rate =
    round2(completed_ids.len() as f64 / scheduled_ids.len() as f64 * 100.0);

  let mut total_volume: u32 = 0;
  let mut total_tonnage = 0.0;
  let mut rpe_sum = 0.0;
  let mut rpe_count = 0;

  // exercise -> (sets, reps, weight sum)
  let mut per_exercise: BTreeMap<String, (u32, u32, f64)> = BTreeMap::new();

  for entry in logged_workouts.iter().flat_map(|l| l.sets.iter()) {
    let set = &entry.set;
    total_volume += set.reps;
    total_tonnage += set.tonnage();
    if let Some(rpe) = set.rpe {
      rpe_sum += rpe;
      rpe_count += 1;
    }

    let agg = per_exercise
      .entry(entry.exercise_id.clone())
      .or_insert((0, 0, 0.0));
    agg.0 += 1;
    agg.1 += set.reps;
    agg.2 += set.weight_kg;
  }

  let avg_rpe = if rpe_count > 0 {
    round2(rpe_sum / rpe_count as f64)
  } else {
    0.0
  };

  let exercise_breakdown = per_exercise
    .into_iter()
    .map(|(exercise_id, (sets, reps, weight_sum))| {
      let breakdown = ExerciseBreakdown {
        sets,
        reps,
        avg_weight: round2(weight_sum / sets as f64),
      };
      (exercise_id, breakdown)
    })
    .collect();

  Ok(WeekPerformanceMetrics {
    completion_rate,
    avg_rpe,
    total_volume,
    total_tonnage: round2(total_tonnage),
    exercise_breakdown,
  })
}

/// ---------------------------------------------------------------------------
/// Week-Over-Week Changes
/// ---------------------------------------------------------------------------

fn percent_change(current: f64, previous: f64) -> f64 {
  if previous == 0.0 {
    0.0
  } else {
    round2((current - previous) / previous * 100.0)
  }
}

/// Deltas against the previous week; all zeros without one
pub fn calculate_week_over_week_changes(
  current: &WeekPerformanceMetrics,
  previous: Option<&WeekPerformanceMetrics>,
) -> WeekOverWeekChanges {
  let previous = match previous {
    Some(p) => p,
    None => return WeekOverWeekChanges::default(),
  };

  WeekOverWeekChanges {
    completion_rate_change: round2(current.completion_rate - previous.completion_rate),
    rpe_change: round2(current.avg_rpe - previous.avg_rpe),
    volume_change_pct: percent_change(current.total_volume as f64, previous.total_volume as f64),
    tonnage_change_pct: percent_change(current.total_tonnage, previous.total_tonnage),
  }
}

/// Whether enough of the week was completed to analyze at all
pub fn is_week_ready_for_analysis(
  performance: &WeekPerformanceMetrics,
  minimum_completion_rate: f64,
) -> bool {
  performance.completion_rate >= minimum_completion_rate
}

/// ---------------------------------------------------------------------------
/// Progression Decision
/// ---------------------------------------------------------------------------

/// Threshold checks shared by every block type
#[derive(Debug, Clone, Copy)]
struct WeekSignals {
  completion_rate: f64,
  avg_rpe: f64,
  rpe_target: f64,
  high_completion: bool,
  moderate_completion: bool,
  low_completion: bool,
  rpe_under_target: bool,
  rpe_on_target: bool,
  rpe_over_target: bool,
  volume_change_pct: Option<f64>,
}

impl WeekSignals {
  fn compute(
    current: &WeekPerformanceMetrics,
    previous: Option<&WeekPerformanceMetrics>,
    block: &PeriodizationBlock,
  ) -> Self {
    let rate = current.completion_rate;
    let avg_rpe = current.avg_rpe;
    let rpe_target = block.rpe_targets.strength;

    let volume_change_pct = previous.map(|p| {
      percent_change(current.total_volume as f64, p.total_volume as f64)
    });

    Self {
      completion_rate: rate,
      avg_rpe,
      rpe_target,
      high_completion: rate >= 80.0,
      moderate_completion: (60.0..80.0).contains(&rate),
      low_completion: rate < 60.0,
      rpe_under_target: avg_rpe > 0.0 && avg_rpe < rpe_target - 1.0,
      rpe_on_target: (avg_rpe - rpe_target).abs() <= 1.0,
      rpe_over_target: avg_rpe > rpe_target + 1.0,
      volume_change_pct,
    }
  }

  fn volume_increased(&self) -> Option<f64> {
    self.volume_change_pct.filter(|pct| *pct > 5.0)
  }

  fn volume_decreased(&self) -> Option<f64> {
    self.volume_change_pct.filter(|pct| *pct < -5.0)
  }
}

fn recommendation(
  decision: ProgressionDecision,
  confidence_score: f64,
  reasoning: String,
  recommendations: Vec<String>,
) -> ProgressionRecommendation {
  ProgressionRecommendation {
    decision,
    reasoning,
    recommendations,
    confidence_score,
  }
}

/// Decide progress / maintain / regress for the week
pub fn generate_progression_recommendations(
  current: &WeekPerformanceMetrics,
  previous: Option<&WeekPerformanceMetrics>,
  current_block: &PeriodizationBlock,
) -> ProgressionRecommendation {
  let signals = WeekSignals::compute(current, previous, current_block);

  let result = match current_block.block_type {
    BlockType::Deload => deload_decision(&signals),
    BlockType::Accumulation => accumulation_decision(&signals),
    BlockType::Intensification => intensification_decision(&signals),
    BlockType::Realization => realization_decision(&signals),
  };

  debug!(
    block_type = %current_block.block_type,
    completion_rate = signals.completion_rate,
    avg_rpe = signals.avg_rpe,
    decision = %result.decision,
    confidence = result.confidence_score,
    "Generated progression recommendation"
  );

  result
}

fn deload_decision(s: &WeekSignals) -> ProgressionRecommendation {
  let mut recommendations = vec![
    "Keep loads light and stop every set well short of failure".to_string(),
    "Prioritize sleep and mobility work this week".to_string(),
  ];
  if s.low_completion {
    recommendations.push("Add an extra rest day if fatigue is still high".to_string());
  }

  recommendation(
    ProgressionDecision::Maintain,
    0.9,
    "Deload week - maintain reduced volume and intensity to recover".to_string(),
    recommendations,
  )
}

fn accumulation_decision(s: &WeekSignals) -> ProgressionRecommendation {
  if s.high_completion && s.rpe_under_target {
    let mut recommendations = vec![
      "Add 1 set to main lifts or increase load 2.5-5%".to_string(),
      format!("Keep working sets around RPE {:.1}", s.rpe_target),
    ];
    if let Some(pct) = s.volume_increased() {
      recommendations.push(format!(
        "Volume already up {:.0}% from last week - prefer load over extra sets",
        pct
      ));
    }
    recommendation(
      ProgressionDecision::Progress,
      0.85,
      format!(
        "Completed {:.0}% of sessions at RPE {:.1}, below the {:.1} target - ready to increase volume or load",
        s.completion_rate, s.avg_rpe, s.rpe_target
      ),
      recommendations,
    )
  } else if s.high_completion && s.rpe_on_target {
    recommendation(
      ProgressionDecision::Maintain,
      0.8,
      format!(
        "Completed {:.0}% of sessions right at the RPE target - keep building at this level",
        s.completion_rate
      ),
      vec![
        "Keep current sets and loads".to_string(),
        "Aim to add 1-2 reps per set before adding load".to_string(),
      ],
    )
  } else if s.moderate_completion || s.rpe_over_target {
    let mut recommendations = vec!["Hold current volume this week".to_string()];
    if s.rpe_over_target {
      recommendations.push("If RPE stays high, reduce 1-2 sets per exercise".to_string());
    } else {
      recommendations.push("Focus on completing every scheduled session".to_string());
    }
    if let Some(pct) = s.volume_decreased() {
      recommendations.push(format!("Volume dropped {:.0}% from last week", pct.abs()));
    }
    recommendation(
      ProgressionDecision::Maintain,
      0.7,
      format!(
        "Completion {:.0}% with RPE {:.1} against a {:.1} target - consolidate before adding volume",
        s.completion_rate, s.avg_rpe, s.rpe_target
      ),
      recommendations,
    )
  } else if s.low_completion {
    recommendation(
      ProgressionDecision::Regress,
      0.75,
      format!(
        "Only {:.0}% of sessions completed - current volume is not sustainable",
        s.completion_rate
      ),
      vec![
        "Reduce volume by 10-15%".to_string(),
        "Consider an early deload if fatigue persists".to_string(),
      ],
    )
  } else {
    no_rpe_signal(s)
  }
}

fn intensification_decision(s: &WeekSignals) -> ProgressionRecommendation {
  if s.high_completion && s.rpe_under_target {
    recommendation(
      ProgressionDecision::Progress,
      0.85,
      format!(
        "Heavy work felt easier than planned (RPE {:.1} vs {:.1}) - ready for more load",
        s.avg_rpe, s.rpe_target
      ),
      vec![
        "Increase load 2.5-5% on main lifts".to_string(),
        "Keep volume steady while load climbs".to_string(),
      ],
    )
  } else if s.high_completion && s.rpe_on_target {
    recommendation(
      ProgressionDecision::Maintain,
      0.8,
      "Heavy sessions completed at the planned effort - repeat the loads".to_string(),
      vec![
        "Repeat current loads and aim for crisper reps".to_string(),
        "Keep rest periods at 3-5 minutes on main lifts".to_string(),
      ],
    )
  } else if s.rpe_over_target || s.moderate_completion {
    recommendation(
      ProgressionDecision::Maintain,
      0.7,
      format!(
        "Effort or completion off plan (RPE {:.1}, {:.0}% completed) - hold loads",
        s.avg_rpe, s.completion_rate
      ),
      vec![
        "Hold current loads for another week".to_string(),
        "Drop the last set of each lift if bar speed slows sharply".to_string(),
      ],
    )
  } else if s.low_completion {
    recommendation(
      ProgressionDecision::Regress,
      0.8,
      format!(
        "Only {:.0}% of heavy sessions completed - load is too high right now",
        s.completion_rate
      ),
      vec![
        "Reduce load by 5-10%".to_string(),
        "Consider extending the accumulation phase".to_string(),
      ],
    )
  } else {
    no_rpe_signal(s)
  }
}

fn realization_decision(s: &WeekSignals) -> ProgressionRecommendation {
  if s.high_completion && s.rpe_on_target {
    recommendation(
      ProgressionDecision::Progress,
      0.9,
      "Peaking sessions on target - ready to test performance".to_string(),
      vec![
        "Attempt performance tests or new 1RMs".to_string(),
        "Warm up with singles at 80-90% before attempts".to_string(),
      ],
    )
  } else if s.rpe_over_target {
    recommendation(
      ProgressionDecision::Maintain,
      0.75,
      format!(
        "Peaking work is running hot (RPE {:.1} vs {:.1}) - protect recovery",
        s.avg_rpe, s.rpe_target
      ),
      vec![
        "Rest 48-72h before peak attempts".to_string(),
        "Trim accessory work to the minimum".to_string(),
      ],
    )
  } else {
    recommendation(
      ProgressionDecision::Maintain,
      0.7,
      "Realization week in progress - stay the course".to_string(),
      vec!["Trust the protocol and keep sessions short and sharp".to_string()],
    )
  }
}

/// High completion but no usable RPE to judge effort
fn no_rpe_signal(s: &WeekSignals) -> ProgressionRecommendation {
  recommendation(
    ProgressionDecision::Maintain,
    0.6,
    format!(
      "Completed {:.0}% of sessions but effort data is missing - maintain for now",
      s.completion_rate
    ),
    vec!["Log RPE on working sets so next week's call can use effort data".to_string()],
  )
}

/// ---------------------------------------------------------------------------
/// Coach Brief Context
/// ---------------------------------------------------------------------------

/// Compact text block handed to the coach-brief generator as context
pub fn summarize_week_for_ai(
  performance: &WeekPerformanceMetrics,
  recommendation: &ProgressionRecommendation,
  week_number: u32,
  block_type: BlockType,
) -> String {
  let mut output = format!("Week {} ({} phase)\n", week_number, block_type);
  output.push_str(&format!("Completion: {:.0}%\n", performance.completion_rate));
  output.push_str(&format!("Average RPE: {:.1}\n", performance.avg_rpe));
  output.push_str(&format!("Total volume: {} reps\n", performance.total_volume));
  output.push_str(&format!("Total tonnage: {:.0} kg\n", performance.total_tonnage));
  output.push_str(&format!("Decision: {}\n", recommendation.decision));
  output.push_str(&format!("Assessment: {}\n", recommendation.reasoning));
  output.push_str("Recommendations:\n");
  for item in &recommendation.recommendations {
    output.push_str(&format!("- {}\n", item));
  }
  output
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
