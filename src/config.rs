use std::env;
use std::str::FromStr;

use serde::Serialize;

use crate::analysis::DEFAULT_MINIMUM_COMPLETION_RATE;
use crate::progression::ProgressionPolicy;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DEFAULT_DATABASE_URL: &str = "sqlite://liftplan.db?mode=rwc";

const DATABASE_URL_VAR: &str = "LIFTPLAN_DATABASE_URL";
const MIN_COMPLETION_RATE_VAR: &str = "LIFTPLAN_MIN_COMPLETION_RATE";
const HEAVY_LOAD_VAR: &str = "LIFTPLAN_HEAVY_LOAD_KG";
const HEAVY_INCREMENT_VAR: &str = "LIFTPLAN_HEAVY_INCREMENT_KG";
const LIGHT_INCREMENT_VAR: &str = "LIFTPLAN_LIGHT_INCREMENT_KG";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

impl Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Engine Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
  pub database_url: String,
  pub min_completion_rate: f64,
  pub policy: ProgressionPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      min_completion_rate: DEFAULT_MINIMUM_COMPLETION_RATE,
      policy: ProgressionPolicy::default(),
    }
  }
}

impl EngineConfig {
  /// Read overrides from the environment; unset variables keep their defaults
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let policy = ProgressionPolicy {
      heavy_load_threshold_kg: parse_var(HEAVY_LOAD_VAR)?
        .unwrap_or(defaults.policy.heavy_load_threshold_kg),
      heavy_increment_kg: parse_var(HEAVY_INCREMENT_VAR)?
        .unwrap_or(defaults.policy.heavy_increment_kg),
      light_increment_kg: parse_var(LIGHT_INCREMENT_VAR)?
        .unwrap_or(defaults.policy.light_increment_kg),
      ..defaults.policy
    };

    Ok(Self {
      database_url: env::var(DATABASE_URL_VAR).unwrap_or(defaults.database_url),
      min_completion_rate: parse_var(MIN_COMPLETION_RATE_VAR)?
        .unwrap_or(defaults.min_completion_rate),
      policy,
    })
  }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
  match env::var(key) {
    Ok(value) => match value.trim().parse() {
      Ok(parsed) => Ok(Some(parsed)),
      Err(_) => Err(ConfigError::Invalid {
        key: key.to_string(),
        value,
      }),
    },
    Err(_) => Ok(None),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
