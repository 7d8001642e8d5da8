use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Plan Inputs
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
  /// Linear progression with a deload every 4th week
  Beginner,
  /// Block periodization: accumulation -> intensification -> deload
  Intermediate,
}

impl std::fmt::Display for ExperienceLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Beginner => write!(f, "beginner"),
      Self::Intermediate => write!(f, "intermediate"),
    }
  }
}

impl std::str::FromStr for ExperienceLevel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "beginner" => Ok(Self::Beginner),
      "intermediate" => Ok(Self::Intermediate),
      _ => Err(format!("Unknown experience level: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalBias {
  Strength,
  Balanced,
  Hypertrophy,
  FatLoss,
}

impl std::fmt::Display for GoalBias {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Strength => write!(f, "strength"),
      Self::Balanced => write!(f, "balanced"),
      Self::Hypertrophy => write!(f, "hypertrophy"),
      Self::FatLoss => write!(f, "fat_loss"),
    }
  }
}

impl std::str::FromStr for GoalBias {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "strength" => Ok(Self::Strength),
      "balanced" => Ok(Self::Balanced),
      "hypertrophy" => Ok(Self::Hypertrophy),
      "fat_loss" => Ok(Self::FatLoss),
      _ => Err(format!("Unknown goal bias: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Block Descriptors
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
  /// Volume emphasis
  Accumulation,
  /// Load emphasis
  Intensification,
  /// Planned recovery week
  Deload,
  /// Peaking / performance testing
  Realization,
}

impl BlockType {
  pub const ALL: [BlockType; 4] = [
    BlockType::Accumulation,
    BlockType::Intensification,
    BlockType::Deload,
    BlockType::Realization,
  ];

  /// Capitalized name for user-facing text
  pub fn label(&self) -> &'static str {
    match self {
      Self::Accumulation => "Accumulation",
      Self::Intensification => "Intensification",
      Self::Deload => "Deload",
      Self::Realization => "Realization",
    }
  }
}

impl std::fmt::Display for BlockType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Accumulation => write!(f, "accumulation"),
      Self::Intensification => write!(f, "intensification"),
      Self::Deload => write!(f, "deload"),
      Self::Realization => write!(f, "realization"),
    }
  }
}

impl std::str::FromStr for BlockType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "accumulation" => Ok(Self::Accumulation),
      "intensification" => Ok(Self::Intensification),
      "deload" => Ok(Self::Deload),
      "realization" => Ok(Self::Realization),
      _ => Err(format!("Unknown block type: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTarget {
  High,
  Moderate,
  Low,
}

impl std::fmt::Display for VolumeTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::High => write!(f, "high"),
      Self::Moderate => write!(f, "moderate"),
      Self::Low => write!(f, "low"),
    }
  }
}

impl std::str::FromStr for VolumeTarget {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "high" => Ok(Self::High),
      "moderate" => Ok(Self::Moderate),
      "low" => Ok(Self::Low),
      _ => Err(format!("Unknown volume target: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityTarget {
  Low,
  Moderate,
  High,
}

impl std::fmt::Display for IntensityTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Low => write!(f, "low"),
      Self::Moderate => write!(f, "moderate"),
      Self::High => write!(f, "high"),
    }
  }
}

impl std::str::FromStr for IntensityTarget {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low" => Ok(Self::Low),
      "moderate" => Ok(Self::Moderate),
      "high" => Ok(Self::High),
      _ => Err(format!("Unknown intensity target: {}", s)),
    }
  }
}

/// Textual rep-range prescriptions, always "low-high"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRanges {
  pub strength: String,
  pub accessory: String,
}

impl RepRanges {
  pub fn new(strength: &str, accessory: &str) -> Self {
    Self {
      strength: strength.to_string(),
      accessory: accessory.to_string(),
    }
  }
}

/// Target session RPE (1-10)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpeTargets {
  pub strength: f64,
  pub accessory: f64,
}

/// ---------------------------------------------------------------------------
/// Framework
/// ---------------------------------------------------------------------------

/// One contiguous phase of a training program (weeks are 1-based, inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodizationBlock {
  pub block_number: u32,
  pub block_type: BlockType,
  pub start_week: u32,
  pub end_week: u32,
  pub volume_target: VolumeTarget,
  pub intensity_target: IntensityTarget,
  pub rep_ranges: RepRanges,
  pub rpe_targets: RpeTargets,
}

impl PeriodizationBlock {
  pub fn contains_week(&self, week_number: u32) -> bool {
    week_number >= self.start_week && week_number <= self.end_week
  }

  pub fn length_weeks(&self) -> u32 {
    self.end_week - self.start_week + 1
  }
}

/// Ordered, gapless sequence of blocks covering weeks 1..=total_weeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodizationFramework {
  pub total_weeks: u32,
  pub blocks: Vec<PeriodizationBlock>,
}
