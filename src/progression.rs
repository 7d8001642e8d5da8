//! Per-Exercise Progression Calculator
//!
//! Turns one exercise's logged sets plus the week-level decision into a
//! concrete prescription for next week:
//! - best set (max weight x reps) anchors the prescription
//! - regress: ~10% off, maintain: same weight, progress: load or reps
//! - deload blocks always override with a ~15% load reduction
//!
//! Also hosts the numeric helpers shared across the engine (1RM estimation,
//! weight-for-reps, deload attenuation, weekly landmarks).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    BlockType, ExerciseProgressionTarget, LoggedSet, PeriodizationBlock, ProgressionDecision,
    ProgressionRecommendation, ProgressionType, RecommendedReps, VolumeLandmark, WeeklyLog,
    WeeklyProgression,
};

// ---------------------------------------------------------------------------
/// Progression Policy: Load increments and reduction factors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionPolicy {
    /// Loads at or above this use the heavy increment
    pub heavy_load_threshold_kg: f64,
    pub heavy_increment_kg: f64,
    pub light_increment_kg: f64,
    /// Multiplier applied on regress weeks
    pub regress_factor: f64,
    /// Multiplier applied in deload blocks
    pub deload_factor: f64,
    /// RPE this far under target justifies adding load mid-range
    pub rpe_headroom: f64,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            heavy_load_threshold_kg: 60.0,
            heavy_increment_kg: 2.5,
            light_increment_kg: 5.0,
            regress_factor: 0.9,
            deload_factor: 0.85,
            rpe_headroom: 1.5,
        }
    }
}

impl ProgressionPolicy {
    /// Load increment for a given working weight
    pub fn increment_for(&self, weight_kg: f64) -> f64 {
        if weight_kg >= self.heavy_load_threshold_kg {
            self.heavy_increment_kg
        } else {
            self.light_increment_kg
        }
    }
}

// ---------------------------------------------------------------------------
/// Rounding Helpers
// ---------------------------------------------------------------------------

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to the nearest 0.5kg (smallest plate pair)
pub fn round_to_half_kg(weight: f64) -> f64 {
    (weight * 2.0).round() / 2.0
}

/// Round to the nearest 2.5kg
pub fn round_to_nearest_2_5(weight: f64) -> f64 {
    (weight / 2.5).round() * 2.5
}

/// Parse a "low-high" rep range
pub fn parse_rep_range(range: &str) -> Option<(u32, u32)> {
    let (low, high) = range.split_once('-')?;
    let low: u32 = low.trim().parse().ok()?;
    let high: u32 = high.trim().parse().ok()?;
    if low <= high {
        Some((low, high))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
/// Exercise Progression
// ---------------------------------------------------------------------------

/// Set maximizing weight x reps; first occurrence wins ties
pub fn select_best_set(sets: &[LoggedSet]) -> Option<&LoggedSet> {
    sets.iter().fold(None, |best: Option<&LoggedSet>, set| match best {
        Some(b) if b.tonnage() >= set.tonnage() => Some(b),
        _ => Some(set),
    })
}

/// Compute next week's prescription with the default policy
pub fn calculate_exercise_progression(
    exercise_id: &str,
    logged_sets: &[LoggedSet],
    current_block: &PeriodizationBlock,
    week_recommendation: &ProgressionRecommendation,
) -> ExerciseProgressionTarget {
    calculate_exercise_progression_with(
        &ProgressionPolicy::default(),
        exercise_id,
        logged_sets,
        current_block,
        week_recommendation,
    )
}

/// Compute next week's prescription under an explicit increment and reduction policy
pub fn calculate_exercise_progression_with(
    policy: &ProgressionPolicy,
    exercise_id: &str,
    logged_sets: &[LoggedSet],
    current_block: &PeriodizationBlock,
    week_recommendation: &ProgressionRecommendation,
) -> ExerciseProgressionTarget {
    let strength_range = &current_block.rep_ranges.strength;
    let target_rpe = current_block.rpe_targets.strength;

    let best = match select_best_set(logged_sets) {
        Some(set) => *set,
        None => {
            return ExerciseProgressionTarget {
                exercise_id: exercise_id.to_string(),
                current_weight: 0.0,
                current_reps: 0,
                current_rpe: None,
                recommended_weight: 0.0,
                recommended_reps: RecommendedReps::Range(strength_range.clone()),
                target_rpe,
                progression_type: ProgressionType::Maintain,
                notes: "No previous data - start light and find a working weight".to_string(),
            };
        }
    };

    let current_weight = best.weight_kg;
    let current_reps = best.reps;

    let (recommended_weight, recommended_reps, progression_type, notes) =
        match week_recommendation.decision {
            ProgressionDecision::Regress => (
                current_weight * policy.regress_factor,
                RecommendedReps::Exact(current_reps),
                ProgressionType::Decrease,
                "Reduce weight by ~10% to recover and rebuild quality reps".to_string(),
            ),
            ProgressionDecision::Maintain => (
                current_weight,
                RecommendedReps::Exact(current_reps),
                ProgressionType::Maintain,
                "Maintain current weights and focus on execution".to_string(),
            ),
            ProgressionDecision::Progress => {
                progress_prescription(policy, &best, logged_sets, strength_range, target_rpe)
            }
        };

    let mut target = ExerciseProgressionTarget {
        exercise_id: exercise_id.to_string(),
        current_weight,
        current_reps,
        current_rpe: best.rpe,
        recommended_weight: round_to_half_kg(recommended_weight),
        recommended_reps,
        target_rpe,
        progression_type,
        notes,
    };

    if current_block.block_type == BlockType::Deload {
        target.recommended_weight = round_to_half_kg(current_weight * policy.deload_factor);
        target.recommended_reps = RecommendedReps::Range(strength_range.clone());
        target.progression_type = ProgressionType::Decrease;
        target.notes = "Deload week: reduce weight by ~15% and cut sets to recover".to_string();
    }

    debug!(
        exercise_id,
        current_weight,
        recommended_weight = target.recommended_weight,
        progression_type = %target.progression_type,
        "Computed exercise progression"
    );

    target
}

/// Progress branch: add load at the top of the range or with RPE headroom, else add reps
fn progress_prescription(
    policy: &ProgressionPolicy,
    best: &LoggedSet,
    logged_sets: &[LoggedSet],
    strength_range: &str,
    target_rpe: f64,
) -> (f64, RecommendedReps, ProgressionType, String) {
    let (range_low, range_high) =
        parse_rep_range(strength_range).unwrap_or((best.reps, best.reps));
    let increment = policy.increment_for(best.weight_kg);

    if best.reps >= range_high {
        return (
            best.weight_kg + increment,
            RecommendedReps::Exact(range_low),
            ProgressionType::Increase,
            format!(
                "Increase weight by {}kg - hit the top of the {} range",
                increment, strength_range
            ),
        );
    }

    let observed_rpe = best.rpe.or_else(|| average_rpe(logged_sets));
    if let Some(rpe) = observed_rpe {
        if rpe < target_rpe - policy.rpe_headroom {
            return (
                best.weight_kg + increment,
                RecommendedReps::Exact(best.reps),
                ProgressionType::Increase,
                format!(
                    "Increase weight by {}kg - RPE {:.1} well below target {:.1}",
                    increment, rpe, target_rpe
                ),
            );
        }
    }

    (
        best.weight_kg,
        RecommendedReps::Exact((best.reps + 1).min(range_high)),
        ProgressionType::Maintain,
        format!(
            "Keep the weight and focus on progressing reps toward {}",
            range_high
        ),
    )
}

/// Mean RPE across sets that carry one
fn average_rpe(sets: &[LoggedSet]) -> Option<f64> {
    let rpes: Vec<f64> = sets.iter().filter_map(|s| s.rpe).collect();
    if rpes.is_empty() {
        None
    } else {
        Some(rpes.iter().sum::<f64>() / rpes.len() as f64)
    }
}

// ---------------------------------------------------------------------------
/// One-Rep-Max Estimation (RPE-adjusted Epley)
// ---------------------------------------------------------------------------

/// Reps the set would have reached at true failure
fn reps_to_failure(reps: u32, rpe: Option<f64>) -> f64 {
    let reps_in_reserve = rpe.map(|r| (10.0 - r).max(0.0)).unwrap_or(0.0);
    reps as f64 + reps_in_reserve
}

/// Estimated 1RM: weight x (1 + reps/30), reps padded by reps-in-reserve
pub fn estimate_one_rep_max(weight: f64, reps: u32, rpe: Option<f64>) -> f64 {
    if reps == 0 || weight <= 0.0 {
        return 0.0;
    }
    let effective_reps = reps_to_failure(reps, rpe);
    if effective_reps <= 1.0 {
        return weight;
    }
    weight * (1.0 + effective_reps / 30.0)
}

/// Weight that yields `target_reps` at `target_rpe`, rounded to 2.5kg
pub fn calculate_weight_for_reps(one_rep_max: f64, target_reps: u32, target_rpe: f64) -> f64 {
    let effective_reps = reps_to_failure(target_reps, Some(target_rpe));
    let weight = if effective_reps <= 1.0 {
        one_rep_max
    } else {
        one_rep_max / (1.0 + effective_reps / 30.0)
    };
    round_to_nearest_2_5(weight)
}

/// Default RPE for `calculate_weight_for_reps`
pub const DEFAULT_TARGET_RPE: f64 = 8.0;

// ---------------------------------------------------------------------------
/// Deload Attenuation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeloadModifiers {
    /// Fraction of conditioning volume removed
    pub volume_reduction: f64,
    /// Fraction of load removed
    pub load_reduction: f64,
}

impl Default for DeloadModifiers {
    fn default() -> Self {
        Self {
            volume_reduction: 0.4,
            load_reduction: 0.15,
        }
    }
}

/// Copy of `progression` with load and zone 2 volume attenuated for a deload
pub fn apply_deload_modifications(
    progression: &WeeklyProgression,
    modifiers: DeloadModifiers,
) -> WeeklyProgression {
    let volume_pct = (modifiers.volume_reduction * 100.0).round();
    let load_pct = (modifiers.load_reduction * 100.0).round();
    let annotation = format!(
        "Deload: volume -{}%, load -{}%",
        volume_pct, load_pct
    );

    let focus_notes = if progression.focus_notes.is_empty() {
        annotation
    } else {
        format!("{} | {}", progression.focus_notes, annotation)
    };

    WeeklyProgression {
        week_number: progression.week_number,
        total_load_kg: (progression.total_load_kg * (1.0 - modifiers.load_reduction)).round(),
        zone2_minutes: (progression.zone2_minutes * (1.0 - modifiers.volume_reduction)).round(),
        is_deload: true,
        focus_notes,
    }
}

// ---------------------------------------------------------------------------
/// Weekly Volume Landmarks
// ---------------------------------------------------------------------------

/// One landmark per week index in [0, total_weeks); weeks without logs are zeros
pub fn calculate_weekly_volume_landmarks(
    weekly_logs: &[WeeklyLog],
    total_weeks: usize,
) -> Vec<VolumeLandmark> {
    (0..total_weeks)
        .map(|week_index| {
            let sets: Vec<&LoggedSet> = weekly_logs
                .iter()
                .filter(|log| log.week_index == week_index)
                .flat_map(|log| log.sets.iter())
                .collect();

            if sets.is_empty() {
                return VolumeLandmark::empty(week_index);
            }

            let volume_landmark: u32 = sets.iter().map(|s| s.reps).sum();
            let intensity_landmark =
                sets.iter().map(|s| s.weight_kg).sum::<f64>() / sets.len() as f64;
            let rpes: Vec<f64> = sets.iter().filter_map(|s| s.rpe).collect();
            let avg_rpe = if rpes.is_empty() {
                0.0
            } else {
                rpes.iter().sum::<f64>() / rpes.len() as f64
            };

            VolumeLandmark {
                week_index,
                volume_landmark,
                intensity_landmark: round2(intensity_landmark),
                avg_rpe: round2(avg_rpe),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
