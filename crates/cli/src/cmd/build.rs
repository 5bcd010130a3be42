//! Implementation of the `baladoc build` command.
//!
//! Runs the full pipeline for one bala URL and renders its single result.

use std::time::Instant;

use anyhow::Result;

use baladoc_lib::{BuildConfig, BuildFailure, BuildPipeline, BuildRequest, BuildSuccess, FailureKind};

use crate::output::{
  OutputFormat, format_elapsed, print_failure, print_json, print_stat, print_success, print_warning,
};

/// Process exit code for a failed build.
///
/// A locator that points nowhere is the caller's mistake and exits with 2,
/// everything else exits with 1.
pub fn exit_code_for(kind: FailureKind) -> i32 {
  match kind {
    FailureKind::SourceNotFound => 2,
    FailureKind::Infrastructure | FailureKind::Unclassified => 1,
  }
}

pub async fn cmd_build(url: &str, config: BuildConfig, output: OutputFormat) -> Result<i32> {
  let start = Instant::now();
  let pipeline = BuildPipeline::new(config);

  match pipeline.build(&BuildRequest::new(url)).await {
    Ok(success) => {
      render_success(url, &success, output, start)?;
      Ok(0)
    }
    Err(failure) => {
      render_failure(&failure, output)?;
      Ok(exit_code_for(failure.kind))
    }
  }
}

fn render_success(url: &str, success: &BuildSuccess, output: OutputFormat, start: Instant) -> Result<()> {
  if output.is_json() {
    return print_json(&success.payload);
  }

  print_success(&format!("Generated docs for {}", url));
  print_stat("Ballerina", &success.toolchain_version);
  match success.exit_code {
    Some(code) => print_stat("Exit code", &code.to_string()),
    None => print_stat("Exit code", "terminated by signal"),
  }
  print_stat("Duration", &format_elapsed(start.elapsed()));

  if success.exit_code != Some(0) {
    print_warning("bal doc did not exit cleanly; pass --strict-exit to treat this as a failure");
  }
  Ok(())
}

fn render_failure(failure: &BuildFailure, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    return print_json(&serde_json::json!({
      "error": failure.message,
      "kind": failure.kind,
    }));
  }

  print_failure(failure.kind, &failure.message);
  Ok(())
}
