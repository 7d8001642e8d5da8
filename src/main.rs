use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use liftplan::commands::{self, CommandError};
use liftplan::models::{
  BlockType, ExercisePrescription, ExerciseSetLog, ExperienceLevel, GoalBias,
};
use liftplan::progression::DEFAULT_TARGET_RPE;
use liftplan::{
  calculate_weight_for_reps, db, describe_periodization_framework, estimate_one_rep_max,
  generate_periodization_framework, get_block_guidelines, EngineConfig,
};

#[derive(Parser)]
#[command(name = "liftplan", version, about)]
pub struct LiftplanCli {
  /// Overrides LIFTPLAN_DATABASE_URL for database-backed commands
  #[arg(long, env = "LIFTPLAN_DATABASE_URL")]
  pub database_url: Option<String>,
  #[command(subcommand)]
  pub command: LiftplanCommand,
}

#[derive(Subcommand)]
pub enum LiftplanCommand {
  ///
  /// Print the block structure for a program length, level and goal
  ///
  Framework {
    #[arg(long)]
    weeks: u32,
    #[arg(long, default_value = "beginner")]
    level: ExperienceLevel,
    #[arg(long, default_value = "balanced")]
    goal: GoalBias,
    #[arg(long)]
    json: bool,
  },
  ///
  /// Print coaching guidelines for a block type
  ///
  Guidelines { block_type: BlockType },
  ///
  /// Estimate a one-rep max from a set
  ///
  OneRm {
    #[arg(long)]
    weight: f64,
    #[arg(long)]
    reps: u32,
    #[arg(long)]
    rpe: Option<f64>,
  },
  ///
  /// Working weight for a rep target from a one-rep max
  ///
  WeightForReps {
    #[arg(long)]
    one_rm: f64,
    #[arg(long)]
    reps: u32,
    #[arg(long, default_value_t = DEFAULT_TARGET_RPE)]
    rpe: f64,
  },
  ///
  /// Create or inspect stored plans
  ///
  Plan {
    #[command(subcommand)]
    action: PlanCommand,
  },
  ///
  /// Schedule a workout in a plan week
  ///
  Schedule {
    #[arg(long)]
    plan: i64,
    #[arg(long)]
    week: u32,
    #[arg(long)]
    name: String,
    /// exercise:sets:reps, e.g. squat:3:8-12
    #[arg(long = "exercise", value_parser = parse_exercise_arg)]
    exercises: Vec<ExercisePrescription>,
  },
  ///
  /// Log a performed session against a scheduled workout
  ///
  Log {
    #[arg(long)]
    workout: i64,
    /// exercise:weight:reps[:rpe], e.g. squat:100:5:8
    #[arg(long = "set", value_parser = parse_set_arg)]
    sets: Vec<ExerciseSetLog>,
  },
  ///
  /// Analyze a week and store next week's targets
  ///
  Review {
    #[arg(long)]
    plan: i64,
    #[arg(long)]
    week: u32,
    #[arg(long)]
    json: bool,
  },
  ///
  /// Print stored exercise targets for a week
  ///
  Targets {
    #[arg(long)]
    plan: i64,
    #[arg(long)]
    week: u32,
  },
}

#[derive(Subcommand)]
pub enum PlanCommand {
  Create {
    #[arg(long)]
    name: String,
    #[arg(long)]
    weeks: u32,
    #[arg(long, default_value = "beginner")]
    level: ExperienceLevel,
    #[arg(long, default_value = "balanced")]
    goal: GoalBias,
  },
  Show {
    #[arg(long)]
    plan: i64,
  },
}

fn parse_exercise_arg(value: &str) -> Result<ExercisePrescription, String> {
  let parts: Vec<&str> = value.split(':').collect();
  match parts.as_slice() {
    [exercise_id, sets, reps] => Ok(ExercisePrescription {
      exercise_id: exercise_id.to_string(),
      target_sets: sets
        .parse()
        .map_err(|_| format!("Invalid set count: {}", sets))?,
      target_reps: reps.to_string(),
    }),
    _ => Err(format!("Expected exercise:sets:reps, got {}", value)),
  }
}

fn parse_set_arg(value: &str) -> Result<ExerciseSetLog, String> {
  let parts: Vec<&str> = value.split(':').collect();
  let (exercise_id, weight, reps, rpe) = match parts.as_slice() {
    [id, weight, reps] => (*id, *weight, *reps, None),
    [id, weight, reps, rpe] => (*id, *weight, *reps, Some(*rpe)),
    _ => return Err(format!("Expected exercise:weight:reps[:rpe], got {}", value)),
  };

  let weight: f64 = weight
    .parse()
    .map_err(|_| format!("Invalid weight: {}", weight))?;
  let reps: u32 = reps.parse().map_err(|_| format!("Invalid reps: {}", reps))?;
  let rpe = match rpe {
    Some(r) => Some(r.parse::<f64>().map_err(|_| format!("Invalid RPE: {}", r))?),
    None => None,
  };

  Ok(ExerciseSetLog::new(exercise_id, weight, reps, rpe))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let cli = LiftplanCli::parse();
  let mut config = EngineConfig::from_env()?;
  if let Some(url) = cli.database_url {
    config.database_url = url;
  }

  match cli.command {
    LiftplanCommand::Framework {
      weeks,
      level,
      goal,
      json,
    } => {
      let framework = generate_periodization_framework(weeks, level, goal);
      if json {
        println!("{}", serde_json::to_string_pretty(&framework)?);
      } else {
        print!("{}", describe_periodization_framework(&framework));
      }
    }
    LiftplanCommand::Guidelines { block_type } => {
      let guidelines = get_block_guidelines(block_type);
      println!("{}", block_type.label());
      println!("  {}", guidelines.description);
      println!("  Volume: {}", guidelines.volume);
      println!("  Intensity: {}", guidelines.intensity);
      println!("  Reps: {}", guidelines.rep_range);
      println!("  Effort: {}", guidelines.rpe);
    }
    LiftplanCommand::OneRm { weight, reps, rpe } => {
      println!("{:.1} kg", estimate_one_rep_max(weight, reps, rpe));
    }
    LiftplanCommand::WeightForReps { one_rm, reps, rpe } => {
      println!("{:.1} kg", calculate_weight_for_reps(one_rm, reps, rpe));
    }
    command => run_database_command(&config, command).await?,
  }

  Ok(())
}

async fn run_database_command(
  config: &EngineConfig,
  command: LiftplanCommand,
) -> Result<(), CommandError> {
  let pool = db::initialize_db(&config.database_url).await?;

  match command {
    LiftplanCommand::Plan {
      action:
        PlanCommand::Create {
          name,
          weeks,
          level,
          goal,
        },
    } => {
      let (plan_id, framework) = commands::create_plan(&pool, &name, weeks, level, goal).await?;
      println!("Created plan {}", plan_id);
      print!("{}", describe_periodization_framework(&framework));
    }
    LiftplanCommand::Plan {
      action: PlanCommand::Show { plan },
    } => {
      let record = commands::load_plan(&pool, plan).await?;
      let framework = commands::load_framework(&pool, plan).await?;
      println!(
        "Plan {}: {} ({}, {})",
        record.id, record.name, record.experience_level, record.goal_bias
      );
      print!("{}", describe_periodization_framework(&framework));
    }
    LiftplanCommand::Schedule {
      plan,
      week,
      name,
      exercises,
    } => {
      let workout = commands::schedule_workout(&pool, plan, week, &name, &exercises).await?;
      println!("Scheduled workout {} in week {}", workout.id, workout.week_number);
    }
    LiftplanCommand::Log { workout, sets } => {
      let logged = commands::log_workout(&pool, workout, chrono::Utc::now(), &sets).await?;
      println!("Logged {} sets for workout {}", logged.sets.len(), workout);
    }
    LiftplanCommand::Review { plan, week, json } => {
      let review = commands::review_week(&pool, config, plan, week).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&review)?);
      } else {
        print!("{}", review.summary);
        println!("Targets for week {}:", week + 1);
        for target in &review.targets {
          println!(
            "  {}: {:.1} kg x {} @ RPE {:.1} ({})",
            target.exercise_id,
            target.recommended_weight,
            target.recommended_reps,
            target.target_rpe,
            target.notes
          );
        }
      }
    }
    LiftplanCommand::Targets { plan, week } => {
      let targets = commands::load_exercise_targets(&pool, plan, week).await?;
      if targets.is_empty() {
        println!("No targets stored for week {}", week);
      }
      for target in &targets {
        println!(
          "  {}: {:.1} kg x {} @ RPE {:.1} [{}]",
          target.exercise_id,
          target.recommended_weight,
          target.recommended_reps,
          target.target_rpe,
          target.progression_type
        );
      }
    }
    LiftplanCommand::Framework { .. }
    | LiftplanCommand::Guidelines { .. }
    | LiftplanCommand::OneRm { .. }
    | LiftplanCommand::WeightForReps { .. } => {}
  }

  pool.close().await;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_exercise_arg() {
    let parsed = parse_exercise_arg("squat:3:8-12").unwrap();
    assert_eq!(parsed.exercise_id, "squat");
    assert_eq!(parsed.target_sets, 3);
    assert_eq!(parsed.target_reps, "8-12");

    assert!(parse_exercise_arg("squat:three:8-12").is_err());
    assert!(parse_exercise_arg("squat").is_err());
  }

  #[test]
  fn test_parse_set_arg() {
    assert_eq!(
      parse_set_arg("squat:100:5:8").unwrap(),
      ExerciseSetLog::new("squat", 100.0, 5, Some(8.0))
    );
    assert_eq!(
      parse_set_arg("bench:62.5:8").unwrap(),
      ExerciseSetLog::new("bench", 62.5, 8, None)
    );
    assert!(parse_set_arg("bench:heavy:8").is_err());
    assert!(parse_set_arg("bench:60:8:8:1").is_err());
  }

  #[test]
  fn test_cli_parses_review() {
    let cli = LiftplanCli::try_parse_from(["liftplan", "review", "--plan", "3", "--week", "2"])
      .unwrap();
    assert!(matches!(
      cli.command,
      LiftplanCommand::Review {
        plan: 3,
        week: 2,
        json: false
      }
    ));
  }
}
