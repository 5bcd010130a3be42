//! Documentation build pipeline.
//!
//! A build runs strictly forward through
//! `Start → WorkspaceAllocated → Fetched → VersionRead → ToolchainResolved → ProcessRun → Done`.
//! The first failing step ends the build, nothing is retried, and the
//! workspace is released on every exit path. Callers always get exactly one
//! [`BuildOutcome`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::archive::{self, ArchiveError};
use crate::config::BuildConfig;
use crate::fetch::{self, FetchError};
use crate::process::{self, DocBuildOutput, ProcessError};
use crate::toolchain::{Toolchain, ToolchainResolver};
use crate::workspace::{Workspace, WorkspaceError};

/// A request to document one bala.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
  /// Locator of the bala to document.
  #[serde(alias = "path")]
  pub source: String,
}

impl BuildRequest {
  pub fn new(source: impl Into<String>) -> Self {
    Self { source: source.into() }
  }
}

/// Success body returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocsPayload {
  #[serde(rename = "apiDocJsons")]
  pub api_doc_jsons: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildSuccess {
  pub payload: DocsPayload,
  /// Normalized compiler version read from the bala.
  pub toolchain_version: String,
  /// Exit code of `bal doc`, `None` if it was killed by a signal.
  pub exit_code: Option<i32>,
}

/// Who is at fault for a failed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  /// The locator is malformed or the bala does not exist.
  SourceNotFound,
  /// Something on our side failed: disk, archive, toolchain or process.
  Infrastructure,
  /// An unexpected fault, such as a panic inside a step.
  Unclassified,
}

impl FailureKind {
  pub fn as_str(self) -> &'static str {
    match self {
      FailureKind::SourceNotFound => "source_not_found",
      FailureKind::Infrastructure => "infrastructure",
      FailureKind::Unclassified => "unclassified",
    }
  }
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFailure {
  pub kind: FailureKind,
  pub message: String,
}

impl fmt::Display for BuildFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.message, self.kind)
  }
}

pub type BuildOutcome = Result<BuildSuccess, BuildFailure>;

/// Steps of a build, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
  Start,
  WorkspaceAllocated,
  Fetched,
  VersionRead,
  ToolchainResolved,
  ProcessRun,
  Done,
}

/// Errors raised by individual steps.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error("unable to locate ballerina dist for version {version} in '{dists_dir}'")]
  ToolchainNotFound {
    version: String,
    dists_dir: std::path::PathBuf,
  },

  #[error(transparent)]
  Process(#[from] ProcessError),

  #[error("doc build with '{toolchain}' exited with {}", describe_exit(.code))]
  DocBuildFailed { toolchain: String, code: Option<i32> },

  #[error("build task failed: {0}")]
  Task(String),
}

impl BuildError {
  pub fn kind(&self) -> FailureKind {
    match self {
      BuildError::Fetch(e) if e.is_source_not_found() => FailureKind::SourceNotFound,
      BuildError::Task(_) => FailureKind::Unclassified,
      _ => FailureKind::Infrastructure,
    }
  }
}

/// Runs documentation builds with a fixed configuration.
///
/// Cheap to clone; concurrent builds share only the read-only dists root.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
  config: Arc<BuildConfig>,
  resolver: ToolchainResolver,
}

impl BuildPipeline {
  pub fn new(config: BuildConfig) -> Self {
    let resolver = ToolchainResolver::new(config.dists_dir.clone());
    Self {
      config: Arc::new(config),
      resolver,
    }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  pub fn resolver(&self) -> &ToolchainResolver {
    &self.resolver
  }

  /// Build documentation for the bala behind `request`.
  ///
  /// The steps run on their own task so that a panic in any of them is
  /// reported as an [`FailureKind::Unclassified`] failure instead of
  /// unwinding into the caller. The workspace is released by then either way.
  pub async fn build(&self, request: &BuildRequest) -> BuildOutcome {
    let source = request.source.clone();
    info!(source = %source, "building docs");

    let pipeline = self.clone();
    let task_source = source.clone();
    let result = isolate(async move { pipeline.run(&task_source).await }).await;

    match result {
      Ok(success) => {
        info!(source = %source, version = %success.toolchain_version, "generated docs");
        Ok(success)
      }
      Err(e) => {
        let kind = e.kind();
        let message = format!("error occurred generating docs: {}: {}", source, e);
        error!(source = %source, kind = %kind, error = %e, "doc build failed");
        Err(BuildFailure { kind, message })
      }
    }
  }

  async fn run(&self, source: &str) -> Result<BuildSuccess, BuildError> {
    advance(Stage::Start, source);

    // Reject malformed locators before touching the filesystem.
    fetch::parse_url(source)?;

    let mut workspace = Workspace::allocate(&self.config.temp_root)?;
    advance(Stage::WorkspaceAllocated, source);

    let result = self.run_in(&workspace, source).await;

    workspace.release();
    advance(Stage::Done, source);
    result
  }

  async fn run_in(&self, workspace: &Workspace, source: &str) -> Result<BuildSuccess, BuildError> {
    fetch::fetch_bala(source, workspace.bala_path(), self.config.fetch_timeout).await?;
    advance(Stage::Fetched, source);

    let bala_path = workspace.bala_path().to_path_buf();
    let version = tokio::task::spawn_blocking(move || archive::read_toolchain_version(&bala_path))
      .await
      .map_err(|e| BuildError::Task(e.to_string()))??;
    advance(Stage::VersionRead, source);

    let toolchain = self.resolve_toolchain(&version)?;
    advance(Stage::ToolchainResolved, source);

    let output = process::run_doc_build(
      &toolchain,
      workspace.bala_path(),
      self.config.doc_output,
      self.config.process_timeout,
    )
    .await?;
    advance(Stage::ProcessRun, source);

    self.check_exit(&toolchain, &output)?;

    Ok(BuildSuccess {
      payload: DocsPayload::default(),
      toolchain_version: version,
      exit_code: output.code,
    })
  }

  fn resolve_toolchain(&self, version: &str) -> Result<Toolchain, BuildError> {
    self
      .resolver
      .resolve(version)
      .ok_or_else(|| BuildError::ToolchainNotFound {
        version: version.to_string(),
        dists_dir: self.resolver.dists_dir().to_path_buf(),
      })
  }

  fn check_exit(&self, toolchain: &Toolchain, output: &DocBuildOutput) -> Result<(), BuildError> {
    if self.config.strict_exit && !output.success {
      return Err(BuildError::DocBuildFailed {
        toolchain: toolchain.name.clone(),
        code: output.code,
      });
    }
    Ok(())
  }
}

/// Run `task` on its own tokio task, turning a panic into [`BuildError::Task`].
///
/// Anything the task owns, such as its [`Workspace`], is dropped while the
/// panic unwinds, before this returns.
async fn isolate<T, F>(task: F) -> Result<T, BuildError>
where
  T: Send + 'static,
  F: Future<Output = Result<T, BuildError>> + Send + 'static,
{
  match tokio::spawn(task).await {
    Ok(result) => result,
    Err(e) if e.is_panic() => Err(BuildError::Task(panic_message(e.into_panic()))),
    Err(e) => Err(BuildError::Task(e.to_string())),
  }
}

fn advance(stage: Stage, source: &str) {
  debug!(?stage, source, "pipeline stage");
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("code {}", code),
    None => "a signal".to_string(),
  }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "panic".to_string()
  }
}
