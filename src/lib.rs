//! Strength training periodization and weekly progression engine
//!
//! The core (`periodization`, `analysis`, `progression`) is pure and
//! synchronous. `commands` wires it to SQLite for plan storage and week reviews.

pub mod analysis;
pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod periodization;
pub mod progression;

#[cfg(test)]
pub mod test_utils;

pub use analysis::{
  analyze_week_performance, calculate_week_over_week_changes, generate_progression_recommendations,
  is_week_ready_for_analysis, summarize_week_for_ai, AnalysisError,
};
pub use config::{ConfigError, EngineConfig};
pub use periodization::{
  describe_periodization_framework, generate_periodization_framework, get_block_guidelines,
  get_block_progress, get_current_block,
};
pub use progression::{
  apply_deload_modifications, calculate_exercise_progression, calculate_weekly_volume_landmarks,
  calculate_weight_for_reps, estimate_one_rep_max, ProgressionPolicy,
};
