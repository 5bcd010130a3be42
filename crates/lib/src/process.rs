//! `bal doc` invocation.
//!
//! Runs the resolved toolchain against a downloaded bala. The child shares
//! our stdout/stderr so its progress shows up live in the service logs. Its
//! stdin is closed: concurrent builds must not compete for one terminal.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::consts::DOC_SUBCOMMAND;
use crate::toolchain::Toolchain;

#[derive(Debug, Error)]
pub enum ProcessError {
  /// The toolchain binary could not be started.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Waiting on the child failed.
  #[error("failed waiting for '{program}': {source}")]
  Wait {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The child ran longer than allowed and was killed.
  #[error("'{program}' did not finish within {timeout:?}")]
  TimedOut { program: PathBuf, timeout: Duration },
}

/// Where the doc process writes its standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocOutput {
  /// Share our stdout.
  #[default]
  Inherit,
  /// Redirect to our stderr, for callers that print results on stdout.
  Stderr,
}

impl DocOutput {
  fn stdio(self) -> Stdio {
    match self {
      DocOutput::Inherit => Stdio::inherit(),
      DocOutput::Stderr => Stdio::from(std::io::stderr()),
    }
  }
}

/// How the doc process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocBuildOutput {
  /// Exit code, `None` if the child was terminated by a signal.
  pub code: Option<i32>,
  pub success: bool,
  pub duration: Duration,
}

/// Build the `bal doc <bala>` command for `toolchain`.
///
/// The working directory is the bala's parent so generated output stays
/// inside the workspace.
pub fn doc_command(toolchain: &Toolchain, bala_path: &Path, output: DocOutput) -> Command {
  let mut command = Command::new(toolchain.bin_path());
  command
    .arg(DOC_SUBCOMMAND)
    .arg(bala_path)
    .stdin(Stdio::null())
    .stdout(output.stdio())
    .stderr(Stdio::inherit())
    .kill_on_drop(true);

  if let Some(parent) = bala_path.parent() {
    command.current_dir(parent);
  }
  command
}

/// Run `bal doc` and wait for it to exit.
///
/// The exit code is reported, not judged; the caller decides whether a
/// non-zero exit is a failure.
pub async fn run_doc_build(
  toolchain: &Toolchain,
  bala_path: &Path,
  output: DocOutput,
  timeout: Option<Duration>,
) -> Result<DocBuildOutput, ProcessError> {
  let program = toolchain.bin_path();
  let bala_path = std::path::absolute(bala_path).map_err(|source| ProcessError::Spawn {
    program: program.clone(),
    source,
  })?;

  info!(program = ?program, bala = ?bala_path, "running doc build");

  let mut child = doc_command(toolchain, &bala_path, output)
    .spawn()
    .map_err(|source| ProcessError::Spawn {
      program: program.clone(),
      source,
    })?;

  let started = Instant::now();
  let status = match timeout {
    Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
      Ok(status) => status,
      Err(_) => {
        if let Err(e) = child.kill().await {
          warn!(program = ?program, error = %e, "failed to kill timed out doc build");
        }
        return Err(ProcessError::TimedOut { program, timeout: limit });
      }
    },
    None => child.wait().await,
  }
  .map_err(|source| ProcessError::Wait {
    program: program.clone(),
    source,
  })?;

  let result = DocBuildOutput {
    code: status.code(),
    success: status.success(),
    duration: started.elapsed(),
  };

  if result.success {
    info!(duration = ?result.duration, "doc build finished");
  } else {
    warn!(code = ?result.code, duration = ?result.duration, "doc build exited unsuccessfully");
  }
  debug!(?status, "doc process status");

  Ok(result)
}
