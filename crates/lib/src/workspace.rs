//! Per-request scratch space.
//!
//! Every build gets its own directory holding the downloaded bala and the
//! documentation output. The directory is released exactly once, either
//! explicitly through [`Workspace::release`] or when the [`Workspace`] is
//! dropped, so early returns and panics still leave nothing behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::consts::{DOCS_DIR_NAME, WORKSPACE_PREFIX};

/// Last stamp handed out, so stamps are strictly increasing within a process.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("failed to resolve temporary root '{path}': {source}")]
  ResolveRoot {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to create workspace under '{path}': {source}")]
  Create {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Outcome of a best-effort delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
  /// Files and directories removed.
  pub removed: usize,
  /// Entries that could not be removed (each was logged).
  pub failed: usize,
}

impl CleanupReport {
  pub fn is_clean(&self) -> bool {
    self.failed == 0
  }

  fn merge(&mut self, other: CleanupReport) {
    self.removed += other.removed;
    self.failed += other.failed;
  }
}

/// Scratch directory owned by a single build.
#[derive(Debug)]
pub struct Workspace {
  root: PathBuf,
  bala_path: PathBuf,
  docs_path: PathBuf,
  released: bool,
}

impl Workspace {
  /// Create a uniquely named directory under `temp_root`.
  ///
  /// Only the root directory is created; the bala file and docs directory
  /// are left for the fetch and doc steps.
  pub fn allocate(temp_root: &Path) -> Result<Self, WorkspaceError> {
    let temp_root = std::path::absolute(temp_root).map_err(|source| WorkspaceError::ResolveRoot {
      path: temp_root.to_path_buf(),
      source,
    })?;

    let stamp = next_stamp();
    let root = tempfile::Builder::new()
      .prefix(&format!("{}{}-", WORKSPACE_PREFIX, stamp))
      .tempdir_in(&temp_root)
      .map_err(|source| WorkspaceError::Create {
        path: temp_root.clone(),
        source,
      })?
      .keep();

    let bala_path = root.join(format!("{}.bala", stamp));
    let docs_path = root.join(DOCS_DIR_NAME);

    debug!(root = ?root, "allocated workspace");
    Ok(Self {
      root,
      bala_path,
      docs_path,
      released: false,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Where the downloaded bala is written.
  pub fn bala_path(&self) -> &Path {
    &self.bala_path
  }

  /// Where documentation output is expected.
  pub fn docs_path(&self) -> &Path {
    &self.docs_path
  }

  pub fn is_released(&self) -> bool {
    self.released
  }

  /// Delete everything this workspace handed out.
  ///
  /// Failures are logged and counted, never returned. Calling this more than
  /// once is a no-op.
  pub fn release(&mut self) -> CleanupReport {
    if self.released {
      return CleanupReport::default();
    }
    self.released = true;

    let mut report = CleanupReport::default();
    for path in [&self.bala_path, &self.docs_path, &self.root] {
      report.merge(release_path(path));
    }

    if report.is_clean() {
      debug!(root = ?self.root, removed = report.removed, "released workspace");
    } else {
      warn!(
        root = ?self.root,
        removed = report.removed,
        failed = report.failed,
        "workspace released with leftovers"
      );
    }
    report
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    self.release();
  }
}

/// Recursively delete `path`, deepest entries first.
///
/// Missing paths are skipped. Every entry that cannot be removed is logged
/// and the walk continues.
pub fn release_path(path: &Path) -> CleanupReport {
  let mut report = CleanupReport::default();

  if fs::symlink_metadata(path).is_err() {
    return report;
  }

  for entry in WalkDir::new(path).contents_first(true) {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        warn!(path = ?path, error = %e, "failed to traverse during cleanup, continuing");
        report.failed += 1;
        continue;
      }
    };

    let result = if entry.file_type().is_dir() {
      fs::remove_dir(entry.path())
    } else {
      fs::remove_file(entry.path())
    };

    match result {
      Ok(()) => report.removed += 1,
      Err(e) => {
        warn!(path = ?entry.path(), error = %e, "failed to delete, continuing");
        report.failed += 1;
      }
    }
  }

  report
}

/// High-resolution stamp that never repeats within the process.
fn next_stamp() -> u64 {
  let now = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_nanos() as u64)
    .unwrap_or_default();

  let mut prev = LAST_STAMP.load(Ordering::Relaxed);
  loop {
    let candidate = now.max(prev + 1);
    match LAST_STAMP.compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed) {
      Ok(_) => return candidate,
      Err(actual) => prev = actual,
    }
  }
}
