use serde::{Deserialize, Serialize};

/// One performed set. Read-only input to the calculators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
  pub weight_kg: f64,
  pub reps: u32,
  pub rpe: Option<f64>,
}

impl LoggedSet {
  pub fn new(weight_kg: f64, reps: u32, rpe: Option<f64>) -> Self {
    Self { weight_kg, reps, rpe }
  }

  /// weight x reps
  pub fn tonnage(&self) -> f64 {
    self.weight_kg * self.reps as f64
  }
}

/// A logged set tagged with the exercise it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSetLog {
  pub exercise_id: String,
  #[serde(flatten)]
  pub set: LoggedSet,
}

impl ExerciseSetLog {
  pub fn new(exercise_id: &str, weight_kg: f64, reps: u32, rpe: Option<f64>) -> Self {
    Self {
      exercise_id: exercise_id.to_string(),
      set: LoggedSet::new(weight_kg, reps, rpe),
    }
  }
}

/// Target prescription for one exercise inside a scheduled workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExercisePrescription {
  pub exercise_id: String,
  pub target_sets: u32,
  pub target_reps: String,
}

/// A workout the plan expects to be performed in a given week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledWorkout {
  pub id: i64,
  pub plan_id: i64,
  pub week_number: u32,
  pub name: String,
  pub exercises: Vec<ExercisePrescription>,
}

/// A performed session and the sets logged during it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedWorkout {
  pub id: i64,
  pub workout_id: i64,
  pub sets: Vec<ExerciseSetLog>,
}

/// All sets logged in one week of a program (week_index is 0-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLog {
  pub week_index: usize,
  pub sets: Vec<LoggedSet>,
}
