pub mod analysis;
pub mod plan;
pub mod workout;

pub use analysis::{
  ExerciseBreakdown, ExerciseProgressionTarget, ProgressionDecision, ProgressionRecommendation,
  ProgressionType, RecommendedReps, VolumeLandmark, WeekOverWeekChanges, WeekPerformanceMetrics,
  WeeklyProgression,
};
pub use plan::{
  BlockType, ExperienceLevel, GoalBias, IntensityTarget, PeriodizationBlock,
  PeriodizationFramework, RepRanges, RpeTargets, VolumeTarget,
};
pub use workout::{
  ExercisePrescription, ExerciseSetLog, LoggedSet, LoggedWorkout, ScheduledWorkout, WeeklyLog,
};
