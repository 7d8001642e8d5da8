//! Periodization framework generator
//!
//! Splits a multi-week program into contiguous training blocks:
//! - Beginner: linear progression, deload every 4th week
//! - Intermediate: repeating accumulation -> intensification -> deload cycles
//!
//! Frameworks are computed once per plan and only read afterwards.

use serde::Serialize;
use tracing::debug;

use crate::models::{
  BlockType, ExperienceLevel, GoalBias, IntensityTarget, PeriodizationBlock,
  PeriodizationFramework, RepRanges, RpeTargets, VolumeTarget,
};

/// Deloads land on multiples of this week number
const DELOAD_INTERVAL_WEEKS: u32 = 4;

/// Intermediate cycle: 2 accumulation weeks, 1 intensification, 1 deload
const CYCLE_ACCUMULATION_WEEKS: u32 = 2;

/// ---------------------------------------------------------------------------
/// Generation
/// ---------------------------------------------------------------------------

/// Build a gapless framework covering weeks 1..=total_weeks
pub fn generate_periodization_framework(
  total_weeks: u32,
  experience_level: ExperienceLevel,
  goal_bias: GoalBias,
) -> PeriodizationFramework {
  let spans = match experience_level {
    ExperienceLevel::Beginner => beginner_spans(total_weeks),
    ExperienceLevel::Intermediate => intermediate_spans(total_weeks),
  };

  let blocks: Vec<PeriodizationBlock> = spans
    .into_iter()
    .enumerate()
    .map(|(idx, (block_type, start, end))| {
      build_block(
        idx as u32 + 1,
        block_type,
        start,
        end,
        experience_level,
        goal_bias,
      )
    })
    .collect();

  debug!(
    total_weeks,
    %experience_level,
    %goal_bias,
    blocks = blocks.len(),
    "Generated periodization framework"
  );

  PeriodizationFramework {
    total_weeks,
    blocks,
  }
}

/// Accumulation stretches separated by single deload weeks at 4, 8, 12, ...
fn beginner_spans(total_weeks: u32) -> Vec<(BlockType, u32, u32)> {
  let mut spans = Vec::new();
  let mut start = 1;

  while start <= total_weeks {
    // Smallest multiple of the interval at or after `start`
    let next_deload = start.div_ceil(DELOAD_INTERVAL_WEEKS) * DELOAD_INTERVAL_WEEKS;

    if next_deload > total_weeks {
      spans.push((BlockType::Accumulation, start, total_weeks));
      break;
    }
    if next_deload > start {
      spans.push((BlockType::Accumulation, start, next_deload - 1));
    }
    spans.push((BlockType::Deload, next_deload, next_deload));
    start = next_deload + 1;
  }

  spans
}

/// Full 4-week cycles, then a collapsed trailing cycle for the remainder
fn intermediate_spans(total_weeks: u32) -> Vec<(BlockType, u32, u32)> {
  let mut spans = Vec::new();
  let full_cycles = total_weeks / DELOAD_INTERVAL_WEEKS;

  for cycle in 0..full_cycles {
    let start = cycle * DELOAD_INTERVAL_WEEKS + 1;
    let intensification_week = start + CYCLE_ACCUMULATION_WEEKS;
    spans.push((BlockType::Accumulation, start, intensification_week - 1));
    spans.push((BlockType::Intensification, intensification_week, intensification_week));
    spans.push((BlockType::Deload, intensification_week + 1, intensification_week + 1));
  }

  let start = full_cycles * DELOAD_INTERVAL_WEEKS + 1;
  match total_weeks % DELOAD_INTERVAL_WEEKS {
    0 => {}
    1 => spans.push((BlockType::Accumulation, start, start)),
    2 => {
      spans.push((BlockType::Accumulation, start, start));
      spans.push((BlockType::Intensification, start + 1, start + 1));
    }
    _ => {
      spans.push((BlockType::Accumulation, start, start + 1));
      spans.push((BlockType::Intensification, start + 2, start + 2));
    }
  }

  spans
}

/// Build a block with the targets its type, level and goal call for
pub fn build_block(
  block_number: u32,
  block_type: BlockType,
  start_week: u32,
  end_week: u32,
  experience_level: ExperienceLevel,
  goal_bias: GoalBias,
) -> PeriodizationBlock {
  let (volume_target, intensity_target) = match block_type {
    BlockType::Accumulation => (VolumeTarget::High, IntensityTarget::Moderate),
    BlockType::Intensification => (VolumeTarget::Moderate, IntensityTarget::High),
    BlockType::Deload => (VolumeTarget::Low, IntensityTarget::Moderate),
    BlockType::Realization => (VolumeTarget::Low, IntensityTarget::High),
  };

  PeriodizationBlock {
    block_number,
    block_type,
    start_week,
    end_week,
    volume_target,
    intensity_target,
    rep_ranges: rep_ranges_for(block_type, goal_bias),
    rpe_targets: rpe_targets_for(block_type, experience_level),
  }
}

fn rep_ranges_for(block_type: BlockType, goal_bias: GoalBias) -> RepRanges {
  match block_type {
    BlockType::Accumulation => match goal_bias {
      GoalBias::Hypertrophy => RepRanges::new("10-12", "12-15"),
      GoalBias::Strength | GoalBias::Balanced | GoalBias::FatLoss => {
        RepRanges::new("8-12", "12-15")
      }
    },
    BlockType::Intensification => match goal_bias {
      GoalBias::Strength => RepRanges::new("4-6", "6-8"),
      GoalBias::Balanced => RepRanges::new("6-8", "8-10"),
      GoalBias::Hypertrophy => RepRanges::new("8-10", "10-12"),
      GoalBias::FatLoss => RepRanges::new("6-8", "10-12"),
    },
    BlockType::Deload => RepRanges::new("6-8", "8-10"),
    BlockType::Realization => RepRanges::new("1-3", "6-8"),
  }
}

fn rpe_targets_for(block_type: BlockType, experience_level: ExperienceLevel) -> RpeTargets {
  match (block_type, experience_level) {
    (BlockType::Accumulation, ExperienceLevel::Beginner) => RpeTargets {
      strength: 7.0,
      accessory: 7.0,
    },
    (BlockType::Accumulation, ExperienceLevel::Intermediate) => RpeTargets {
      strength: 7.5,
      accessory: 7.0,
    },
    (BlockType::Intensification, _) => RpeTargets {
      strength: 8.5,
      accessory: 8.0,
    },
    (BlockType::Deload, _) => RpeTargets {
      strength: 6.0,
      accessory: 6.0,
    },
    (BlockType::Realization, _) => RpeTargets {
      strength: 9.5,
      accessory: 8.0,
    },
  }
}

/// ---------------------------------------------------------------------------
/// Lookups
/// ---------------------------------------------------------------------------

impl PeriodizationFramework {
  /// True when blocks are ordered, contiguous and cover exactly 1..=total_weeks
  pub fn is_gapless(&self) -> bool {
    let mut expected_start = 1;
    for block in &self.blocks {
      if block.start_week != expected_start || block.end_week < block.start_week {
        return false;
      }
      expected_start = block.end_week + 1;
    }
    expected_start == self.total_weeks + 1
  }
}

/// Block containing `week_number`; None outside 1..=total_weeks
pub fn get_current_block(
  framework: &PeriodizationFramework,
  week_number: u32,
) -> Option<&PeriodizationBlock> {
  if week_number == 0 || week_number > framework.total_weeks {
    return None;
  }
  framework.blocks.iter().find(|b| b.contains_week(week_number))
}

/// Fraction of the block completed at `week_number`, clamped to [0, 1]
pub fn get_block_progress(block: &PeriodizationBlock, week_number: u32) -> f64 {
  if week_number < block.start_week {
    return 0.0;
  }
  if week_number >= block.end_week {
    return 1.0;
  }
  let elapsed = (week_number - block.start_week) as f64;
  (elapsed / block.length_weeks() as f64).clamp(0.0, 1.0)
}

/// ---------------------------------------------------------------------------
/// User-Facing Text
/// ---------------------------------------------------------------------------

/// Static guidance for one block type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockGuidelines {
  pub volume: &'static str,
  pub intensity: &'static str,
  pub rep_range: &'static str,
  pub rpe: &'static str,
  pub description: &'static str,
}

pub fn get_block_guidelines(block_type: BlockType) -> BlockGuidelines {
  match block_type {
    BlockType::Accumulation => BlockGuidelines {
      volume: "High volume: 3-5 sets per exercise, add sets week to week",
      intensity: "Moderate loads, roughly 65-75% of 1RM",
      rep_range: "8-12 reps on main lifts, 12-15 on accessories",
      rpe: "RPE 7 (about 3 reps in reserve)",
      description: "Build work capacity and muscle with progressively more volume.",
    },
    BlockType::Intensification => BlockGuidelines {
      volume: "Moderate volume: 3-4 sets per exercise",
      intensity: "Heavy loads, roughly 75-87% of 1RM",
      rep_range: "4-8 reps on main lifts, 6-10 on accessories",
      rpe: "RPE 8-9 (1-2 reps in reserve)",
      description: "Convert accumulated volume into strength by raising load.",
    },
    BlockType::Deload => BlockGuidelines {
      volume: "Low volume: cut sets by about 40%",
      intensity: "Reduce loads by about 15%",
      rep_range: "6-8 reps on main lifts, 8-10 on accessories",
      rpe: "RPE 6 (4+ reps in reserve)",
      description: "Dissipate fatigue so the next block starts fresh.",
    },
    BlockType::Realization => BlockGuidelines {
      volume: "Low volume: 1-3 top sets on main lifts",
      intensity: "Near-maximal loads, 90%+ of 1RM",
      rep_range: "1-3 reps on main lifts",
      rpe: "RPE 9-10 on test sets",
      description: "Express peak strength and test new maxes.",
    },
  }
}

/// Multi-line summary of the whole program
pub fn describe_periodization_framework(framework: &PeriodizationFramework) -> String {
  let mut output = format!(
    "{}-week periodized program ({} blocks):\n",
    framework.total_weeks,
    framework.blocks.len()
  );

  for block in &framework.blocks {
    let weeks = if block.start_week == block.end_week {
      format!("Week {}", block.start_week)
    } else {
      format!("Weeks {}-{}", block.start_week, block.end_week)
    };
    output.push_str(&format!(
      "  {}: {} ({} volume, {} intensity)\n",
      weeks,
      block.block_type.label(),
      block.volume_target,
      block.intensity_target
    ));
  }

  output
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
