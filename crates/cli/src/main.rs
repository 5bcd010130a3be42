mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use baladoc_lib::{BuildConfig, DocOutput};
use baladoc_lib::consts::{ENV_DISTS_DIR, ENV_FETCH_TIMEOUT, ENV_PROCESS_TIMEOUT, ENV_STRICT_EXIT, ENV_TEMP_DIR};

use crate::output::{OutputFormat, print_error};

/// baladoc - build API docs for bala packages with the matching Ballerina distribution
#[derive(Parser)]
#[command(name = "baladoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  /// Directory holding one subdirectory per installed distribution
  #[arg(long, global = true, env = ENV_DISTS_DIR)]
  dists_dir: Option<PathBuf>,

  /// Directory under which per-build workspaces are created
  #[arg(long, global = true, env = ENV_TEMP_DIR)]
  temp_dir: Option<PathBuf>,

  /// Give up downloading after this long (e.g. "30s")
  #[arg(long, global = true, env = ENV_FETCH_TIMEOUT, value_parser = humantime::parse_duration)]
  fetch_timeout: Option<Duration>,

  /// Kill `bal doc` after this long (e.g. "10m")
  #[arg(long, global = true, env = ENV_PROCESS_TIMEOUT, value_parser = humantime::parse_duration)]
  process_timeout: Option<Duration>,

  /// Fail the build when `bal doc` exits with a non-zero code
  #[arg(long, global = true, env = ENV_STRICT_EXIT)]
  strict_exit: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Download a bala and build its docs
  Build {
    /// URL of the bala (http, https or file)
    url: String,
  },

  /// Show the manifest of a local bala
  Inspect {
    /// Path to the bala file
    bala: PathBuf,
  },

  /// List installed distributions, or resolve one version
  Toolchains {
    /// Version to resolve (e.g. 2201.4.1)
    version: Option<String>,
  },
}

impl Cli {
  fn build_config(&self) -> BuildConfig {
    let defaults = BuildConfig::default();
    BuildConfig {
      dists_dir: self.dists_dir.clone().unwrap_or(defaults.dists_dir),
      temp_root: self.temp_dir.clone().unwrap_or(defaults.temp_root),
      fetch_timeout: self.fetch_timeout,
      process_timeout: self.process_timeout,
      strict_exit: self.strict_exit,
      doc_output: if self.output.is_json() {
        DocOutput::Stderr
      } else {
        DocOutput::Inherit
      },
    }
  }
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "baladoc=debug" } else { "baladoc=info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(code) => std::process::exit(code),
    Err(e) => {
      print_error(&format!("{:#}", e));
      std::process::exit(1);
    }
  }
}

fn run(cli: Cli) -> Result<i32> {
  let config = cli.build_config();
  let output = cli.output;
  debug!(?config, "resolved configuration");

  match cli.command {
    Commands::Build { url } => {
      let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
      rt.block_on(cmd::cmd_build(&url, config, output))
    }
    Commands::Inspect { bala } => cmd::cmd_inspect(&bala, output).map(|()| 0),
    Commands::Toolchains { version } => cmd::cmd_toolchains(&config, version.as_deref(), output),
  }
}
