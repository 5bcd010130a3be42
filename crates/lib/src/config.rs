//! Pipeline configuration.
//!
//! Everything the pipeline reads from its environment is injected through
//! [`BuildConfig`], so tests can point it at temporary dists roots.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::consts::{
  DEFAULT_DISTS_DIR, ENV_DISTS_DIR, ENV_FETCH_TIMEOUT, ENV_PROCESS_TIMEOUT, ENV_STRICT_EXIT, ENV_TEMP_DIR,
};
use crate::process::DocOutput;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid duration in {var}: '{value}': {source}")]
  InvalidDuration {
    var: &'static str,
    value: String,
    #[source]
    source: humantime::DurationError,
  },

  #[error("invalid boolean in {var}: '{value}'")]
  InvalidBool { var: &'static str, value: String },
}

/// Configuration for a documentation build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Directory whose immediate subdirectories are toolchain installations.
  pub dists_dir: PathBuf,

  /// Directory under which per-request workspaces are created.
  pub temp_root: PathBuf,

  /// Upper bound for downloading the bala. `None` waits indefinitely.
  pub fetch_timeout: Option<Duration>,

  /// Upper bound for the `bal doc` process. `None` waits indefinitely.
  pub process_timeout: Option<Duration>,

  /// Treat a non-zero toolchain exit code as a failed build.
  pub strict_exit: bool,

  /// Where `bal doc` writes its standard output.
  pub doc_output: DocOutput,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      dists_dir: PathBuf::from(DEFAULT_DISTS_DIR),
      temp_root: std::env::temp_dir(),
      fetch_timeout: None,
      process_timeout: None,
      strict_exit: false,
      doc_output: DocOutput::Inherit,
    }
  }
}

impl BuildConfig {
  /// Defaults overlaid with any `BALADOC_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(dir) = non_empty_var(ENV_DISTS_DIR) {
      config.dists_dir = PathBuf::from(dir);
    }
    if let Some(dir) = non_empty_var(ENV_TEMP_DIR) {
      config.temp_root = PathBuf::from(dir);
    }
    if let Some(value) = non_empty_var(ENV_FETCH_TIMEOUT) {
      config.fetch_timeout = Some(parse_duration(ENV_FETCH_TIMEOUT, value)?);
    }
    if let Some(value) = non_empty_var(ENV_PROCESS_TIMEOUT) {
      config.process_timeout = Some(parse_duration(ENV_PROCESS_TIMEOUT, value)?);
    }
    if let Some(value) = non_empty_var(ENV_STRICT_EXIT) {
      config.strict_exit = parse_bool(ENV_STRICT_EXIT, value)?;
    }

    debug!(?config, "loaded build configuration");
    Ok(config)
  }
}

fn non_empty_var(var: &str) -> Option<String> {
  std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_duration(var: &'static str, value: String) -> Result<Duration, ConfigError> {
  humantime::parse_duration(value.trim()).map_err(|source| ConfigError::InvalidDuration { var, value, source })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(ConfigError::InvalidBool { var, value }),
  }
}
