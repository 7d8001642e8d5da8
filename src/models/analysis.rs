use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Week Metrics
/// ---------------------------------------------------------------------------

/// Per-exercise aggregate inside a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBreakdown {
  pub sets: u32,
  pub reps: u32,
  pub avg_weight: f64,
}

/// Aggregate result of analyzing one week's logged activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPerformanceMetrics {
  /// Logged / scheduled workouts, 0-100
  pub completion_rate: f64,

  /// Mean RPE over sets that carry one (0 if none do)
  pub avg_rpe: f64,

  /// Sum of reps
  pub total_volume: u32,

  /// Sum of weight x reps
  pub total_tonnage: f64,

  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub exercise_breakdown: BTreeMap<String, ExerciseBreakdown>,
}

/// Deltas between two consecutive weeks
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeekOverWeekChanges {
  /// Absolute point difference in completion rate
  pub completion_rate_change: f64,
  /// Absolute RPE difference
  pub rpe_change: f64,
  /// Percentage change in total reps
  pub volume_change_pct: f64,
  /// Percentage change in tonnage
  pub tonnage_change_pct: f64,
}

/// ---------------------------------------------------------------------------
/// Week-Level Decision
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionDecision {
  Progress,
  Maintain,
  Regress,
}

impl std::fmt::Display for ProgressionDecision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Progress => write!(f, "progress"),
      Self::Maintain => write!(f, "maintain"),
      Self::Regress => write!(f, "regress"),
    }
  }
}

impl std::str::FromStr for ProgressionDecision {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "progress" => Ok(Self::Progress),
      "maintain" => Ok(Self::Maintain),
      "regress" => Ok(Self::Regress),
      _ => Err(format!("Unknown progression decision: {}", s)),
    }
  }
}

/// The week-level decision with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecommendation {
  pub decision: ProgressionDecision,
  pub reasoning: String,
  pub recommendations: Vec<String>,
  /// (0, 1]
  pub confidence_score: f64,
}

impl ProgressionRecommendation {
  pub fn should_progress(&self) -> bool {
    self.decision == ProgressionDecision::Progress
  }

  pub fn should_maintain(&self) -> bool {
    self.decision == ProgressionDecision::Maintain
  }

  pub fn should_regress(&self) -> bool {
    self.decision == ProgressionDecision::Regress
  }
}

/// ---------------------------------------------------------------------------
/// Per-Exercise Target
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionType {
  Increase,
  Maintain,
  Decrease,
}

impl std::fmt::Display for ProgressionType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Increase => write!(f, "increase"),
      Self::Maintain => write!(f, "maintain"),
      Self::Decrease => write!(f, "decrease"),
    }
  }
}

impl std::str::FromStr for ProgressionType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "increase" => Ok(Self::Increase),
      "maintain" => Ok(Self::Maintain),
      "decrease" => Ok(Self::Decrease),
      _ => Err(format!("Unknown progression type: {}", s)),
    }
  }
}

/// Either an exact rep count or a textual range like "8-12"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendedReps {
  Exact(u32),
  Range(String),
}

impl std::fmt::Display for RecommendedReps {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Exact(reps) => write!(f, "{}", reps),
      Self::Range(range) => write!(f, "{}", range),
    }
  }
}

impl std::str::FromStr for RecommendedReps {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.parse::<u32>() {
      Ok(reps) => Ok(Self::Exact(reps)),
      Err(_) if s.contains('-') => Ok(Self::Range(s.to_string())),
      Err(_) => Err(format!("Unknown rep prescription: {}", s)),
    }
  }
}

/// Next-week prescription for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgressionTarget {
  pub exercise_id: String,
  pub current_weight: f64,
  pub current_reps: u32,
  pub current_rpe: Option<f64>,
  pub recommended_weight: f64,
  pub recommended_reps: RecommendedReps,
  pub target_rpe: f64,
  pub progression_type: ProgressionType,
  pub notes: String,
}

/// ---------------------------------------------------------------------------
/// Program-Level Aggregates
/// ---------------------------------------------------------------------------

/// Weekly load/volume prescription that deload attenuation applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgression {
  pub week_number: u32,
  pub total_load_kg: f64,
  pub zone2_minutes: f64,
  pub is_deload: bool,
  pub focus_notes: String,
}

/// Aggregated landmarks for one week (week_index is 0-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeLandmark {
  pub week_index: usize,
  /// Sum of reps
  pub volume_landmark: u32,
  /// Mean weight across sets
  pub intensity_landmark: f64,
  pub avg_rpe: f64,
}

impl VolumeLandmark {
  pub fn empty(week_index: usize) -> Self {
    Self {
      week_index,
      volume_landmark: 0,
      intensity_landmark: 0.0,
      avg_rpe: 0.0,
    }
  }
}
