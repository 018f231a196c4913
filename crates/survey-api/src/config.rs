//! Server configuration.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! then the process environment. Only the variables in [`ENV_KEYS`] are read
//! from the environment.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use survey_core::anonymize::{AddressAnonymizer, DEFAULT_IP_HASH_SALT};
use thiserror::Error;

/// Environment variables consulted, matching the deployment's `.env` file.
pub const ENV_KEYS: &[&str] = &[
  "DATABASE_URL",
  "CORS_ORIGIN",
  "IP_HASH_SALT",
  "PORT",
  "RATE_LIMIT_PER_MINUTE",
];

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Source(#[from] config::ConfigError),

  #[error("database_url must be set")]
  MissingDatabaseUrl,

  #[error("rate_limit_per_minute must be at least 1")]
  ZeroRateLimit,
}

/// Runtime server configuration.
///
/// Not `Debug`: it holds the hash salt and the database connection string.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub database_url:          String,
  /// Comma-separated allowed origins; `*` allows any.
  pub cors_origin:           String,
  pub ip_hash_salt:          String,
  pub rate_limit_per_minute: u32,
}

impl ServerConfig {
  /// Load from `file` (if it exists) and the process environment.
  pub fn load(file: &Path) -> Result<Self, ConfigError> {
    let env = ENV_KEYS
      .iter()
      .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
      .collect();
    Self::from_sources(Some(file), env)
  }

  /// Load from an optional file and a variable map. Variables outside
  /// [`ENV_KEYS`] are ignored.
  pub fn from_sources(
    file: Option<&Path>,
    env:  HashMap<String, String>,
  ) -> Result<Self, ConfigError> {
    let mut builder = config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8080_i64)?
      .set_default("cors_origin", "*")?
      .set_default("ip_hash_salt", DEFAULT_IP_HASH_SALT)?
      .set_default("rate_limit_per_minute", 60_i64)?;

    if let Some(file) = file {
      builder = builder.add_source(config::File::from(file).required(false));
    }

    let settings = builder
      .add_source(config::Environment::default().source(Some(
        env
          .into_iter()
          .filter(|(key, _)| ENV_KEYS.contains(&key.as_str()))
          .collect(),
      )))
      .build()?;

    let cfg: ServerConfig = settings.try_deserialize()?;
    cfg.check()?;
    Ok(cfg)
  }

  fn check(&self) -> Result<(), ConfigError> {
    if self.database_url.trim().is_empty() {
      return Err(ConfigError::MissingDatabaseUrl);
    }
    if self.rate_limit_per_minute == 0 {
      return Err(ConfigError::ZeroRateLimit);
    }
    Ok(())
  }

  /// Allowed CORS origins; empty means any origin.
  pub fn cors_origins(&self) -> Vec<String> {
    let origins: Vec<String> = self
      .cors_origin
      .split(',')
      .map(str::trim)
      .filter(|o| !o.is_empty())
      .map(str::to_owned)
      .collect();
    if origins.iter().any(|o| o == "*") {
      Vec::new()
    } else {
      origins
    }
  }

  pub fn anonymizer(&self) -> AddressAnonymizer {
    AddressAnonymizer::new(self.ip_hash_salt.clone())
  }
}
