//! Bala archive inspection.
//!
//! A bala is a zip archive with a `package.json` manifest at its root. The
//! manifest's `ballerina_version` names the distribution the package was
//! compiled with; only the part before the first `-` matters when picking a
//! toolchain.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{MANIFEST_ENTRY, MAX_MANIFEST_BYTES};

/// Errors that can occur while reading a bala.
#[derive(Debug, Error)]
pub enum ArchiveError {
  /// The bala file could not be opened.
  #[error("failed to open bala '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The file is not a readable zip archive.
  #[error("'{path}' is not a valid bala archive: {source}")]
  InvalidArchive {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  /// The archive has no manifest entry.
  #[error("bala '{path}' has no package.json")]
  MissingManifest { path: PathBuf },

  /// The manifest entry is not the expected JSON object.
  #[error("invalid package.json in '{path}': {message}")]
  InvalidManifest { path: PathBuf, message: String },

  /// The manifest does not declare a compiler version.
  #[error("package.json in '{path}' does not declare ballerina_version")]
  MissingVersion { path: PathBuf },
}

/// The `package.json` record embedded in a bala.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalaManifest {
  #[serde(default)]
  pub organization: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default)]
  pub platform: Option<String>,
  #[serde(default)]
  pub ballerina_version: Option<String>,
}

impl BalaManifest {
  /// The compiler version with any pre-release suffix removed.
  pub fn toolchain_version(&self) -> Option<&str> {
    self
      .ballerina_version
      .as_deref()
      .map(normalize_version)
      .filter(|v| !v.is_empty())
  }
}

/// Strips everything from the first `-` onwards.
///
/// `2201.4.1-20230101-abc` becomes `2201.4.1`.
pub fn normalize_version(raw: &str) -> &str {
  raw.split('-').next().unwrap_or(raw).trim()
}

/// Read the manifest out of the bala at `path`.
pub fn read_manifest(path: &Path) -> Result<BalaManifest, ArchiveError> {
  let file = File::open(path).map_err(|source| ArchiveError::Open {
    path: path.to_path_buf(),
    source,
  })?;

  let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::InvalidArchive {
    path: path.to_path_buf(),
    source,
  })?;

  let mut entry = match archive.by_name(MANIFEST_ENTRY) {
    Ok(entry) => entry,
    Err(zip::result::ZipError::FileNotFound) => {
      return Err(ArchiveError::MissingManifest {
        path: path.to_path_buf(),
      });
    }
    Err(source) => {
      return Err(ArchiveError::InvalidArchive {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  // The declared size comes from the archive and cannot be trusted.
  let mut content = Vec::new();
  entry
    .by_ref()
    .take(MAX_MANIFEST_BYTES + 1)
    .read_to_end(&mut content)
    .map_err(|e| ArchiveError::InvalidManifest {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

  if content.len() as u64 > MAX_MANIFEST_BYTES {
    return Err(ArchiveError::InvalidManifest {
      path: path.to_path_buf(),
      message: format!("manifest is larger than {} bytes", MAX_MANIFEST_BYTES),
    });
  }

  serde_json::from_slice(&content).map_err(|e| ArchiveError::InvalidManifest {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}

/// Read the normalized compiler version of the bala at `path`.
pub fn read_toolchain_version(path: &Path) -> Result<String, ArchiveError> {
  let manifest = read_manifest(path)?;

  let version = manifest
    .toolchain_version()
    .ok_or_else(|| ArchiveError::MissingVersion {
      path: path.to_path_buf(),
    })?
    .to_string();

  debug!(
    path = ?path,
    raw = manifest.ballerina_version.as_deref().unwrap_or_default(),
    version = %version,
    "read bala compiler version"
  );
  Ok(version)
}
