//! Installed toolchain lookup.
//!
//! Distributions live side by side under a single dists root, one directory
//! per installation (`/dists/ballerina-2201.4.1`, ...). A version is matched
//! against directory names by substring, the way the distributions are
//! usually named, with a deterministic preference when several match.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::consts::TOOLCHAIN_BIN;

/// A single installed distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
  pub name: String,
  pub root: PathBuf,
}

impl Toolchain {
  /// Path of the `bal` executable inside this installation.
  pub fn bin_path(&self) -> PathBuf {
    self.root.join(TOOLCHAIN_BIN)
  }
}

/// How well a directory name matches a requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchQuality {
  /// Version appears inside a longer version (`2201.4.1` in `2201.4.10`).
  Partial,
  /// Version appears as a complete token.
  Token,
  /// Name equals the version.
  Exact,
}

/// Resolves versions to installations under a dists root.
#[derive(Debug, Clone)]
pub struct ToolchainResolver {
  dists_dir: PathBuf,
}

impl ToolchainResolver {
  pub fn new(dists_dir: impl Into<PathBuf>) -> Self {
    Self {
      dists_dir: dists_dir.into(),
    }
  }

  pub fn dists_dir(&self) -> &Path {
    &self.dists_dir
  }

  /// All installations, sorted by name.
  ///
  /// An unreadable or missing dists root yields an empty list.
  pub fn list(&self) -> Vec<Toolchain> {
    let entries = match fs::read_dir(&self.dists_dir) {
      Ok(entries) => entries,
      Err(e) => {
        warn!(dists_dir = ?self.dists_dir, error = %e, "cannot read toolchain directory");
        return Vec::new();
      }
    };

    let mut toolchains: Vec<Toolchain> = entries
      .flatten()
      .filter(|entry| entry.path().is_dir())
      .map(|entry| Toolchain {
        name: entry.file_name().to_string_lossy().into_owned(),
        root: entry.path(),
      })
      .collect();

    toolchains.sort_by(|a, b| a.name.cmp(&b.name));
    toolchains
  }

  /// Find the installation for `version`.
  ///
  /// Every installation whose name contains `version` is a candidate. An
  /// exact name wins over a whole-token match, which wins over a match
  /// inside a longer version; ties go to the lexicographically first name.
  pub fn resolve(&self, version: &str) -> Option<Toolchain> {
    if version.is_empty() {
      return None;
    }

    let best = self
      .list()
      .into_iter()
      .filter_map(|tc| match_quality(&tc.name, version).map(|q| (q, tc)))
      .min_by(|(qa, a), (qb, b)| match qb.cmp(qa) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
      })
      .map(|(_, tc)| tc);

    match &best {
      Some(tc) => debug!(version, toolchain = %tc.name, "resolved toolchain"),
      None => warn!(version, dists_dir = ?self.dists_dir, "no toolchain matches version"),
    }
    best
  }
}

fn match_quality(name: &str, version: &str) -> Option<MatchQuality> {
  if name == version {
    return Some(MatchQuality::Exact);
  }

  let mut quality = None;
  for (idx, _) in name.match_indices(version) {
    let before = name[..idx].chars().next_back();
    let after = name[idx + version.len()..].chars().next();
    let bounded = !before.is_some_and(is_version_char) && !after.is_some_and(is_version_char);
    let q = if bounded {
      MatchQuality::Token
    } else {
      MatchQuality::Partial
    };
    quality = quality.max(Some(q));
  }
  quality
}

fn is_version_char(c: char) -> bool {
  c.is_ascii_digit() || c == '.'
}
