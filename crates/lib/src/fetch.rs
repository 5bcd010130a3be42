//! Bala download.
//!
//! Streams the resource behind a locator into a file inside the build's
//! workspace. Errors are split by who is at fault: a locator that is
//! malformed or points nowhere is the caller's problem, while failing to
//! write locally is ours.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Errors that can occur while fetching a bala.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The locator is not an absolute URL.
  #[error("invalid bala URL '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  /// The locator uses a scheme we cannot read.
  #[error("unsupported URL scheme '{scheme}' in '{url}'")]
  UnsupportedScheme { url: String, scheme: String },

  /// The remote host or local source could not be reached.
  #[error("unable to locate bala '{url}': {message}")]
  Unreachable { url: String, message: String },

  /// The server answered with a non-success status.
  #[error("unable to locate bala '{url}': HTTP {status}")]
  Status { url: String, status: u16 },

  /// The download did not finish in time.
  #[error("fetching '{url}' timed out after {timeout:?}")]
  TimedOut { url: String, timeout: Duration },

  /// The connection failed while the body was being read.
  #[error("error reading from '{url}': {message}")]
  Transfer { url: String, message: String },

  /// The destination could not be created or written.
  #[error("unable to write bala file '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl FetchError {
  /// True when the locator itself is at fault rather than local resources.
  pub fn is_source_not_found(&self) -> bool {
    matches!(
      self,
      FetchError::InvalidUrl { .. }
        | FetchError::UnsupportedScheme { .. }
        | FetchError::Unreachable { .. }
        | FetchError::Status { .. }
    )
  }
}

/// Parse a locator into an absolute URL.
pub fn parse_url(url: &str) -> Result<Url, FetchError> {
  Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
    url: url.to_string(),
    message: e.to_string(),
  })
}

/// Download `url` into `dest`, overwriting any existing file.
///
/// Supports `http`, `https` and `file` locators. `dest` is only created once
/// the source is known to exist, so a bad locator leaves no file behind.
///
/// # Returns
///
/// The number of bytes written.
pub async fn fetch_bala(url: &str, dest: &Path, timeout: Option<Duration>) -> Result<u64, FetchError> {
  let parsed = parse_url(url)?;
  info!(url = %parsed, dest = ?dest, "fetching bala");

  let transfer = async {
    match parsed.scheme() {
      "http" | "https" => fetch_http(&parsed, dest).await,
      "file" => copy_local(&parsed, dest).await,
      scheme => Err(FetchError::UnsupportedScheme {
        url: url.to_string(),
        scheme: scheme.to_string(),
      }),
    }
  };

  let written = match timeout {
    Some(limit) => tokio::time::timeout(limit, transfer)
      .await
      .map_err(|_| FetchError::TimedOut {
        url: url.to_string(),
        timeout: limit,
      })??,
    None => transfer.await?,
  };

  info!(path = ?dest, size = written, "download complete");
  Ok(written)
}

async fn fetch_http(url: &Url, dest: &Path) -> Result<u64, FetchError> {
  let mut response = reqwest::get(url.clone()).await.map_err(|e| FetchError::Unreachable {
    url: url.to_string(),
    message: error_chain(&e),
  })?;

  let status = response.status();
  if !status.is_success() {
    return Err(FetchError::Status {
      url: url.to_string(),
      status: status.as_u16(),
    });
  }

  let mut file = fs::File::create(dest).await.map_err(|source| FetchError::Io {
    path: dest.to_path_buf(),
    source,
  })?;

  let mut written = 0u64;
  while let Some(chunk) = response.chunk().await.map_err(|e| FetchError::Transfer {
    url: url.to_string(),
    message: error_chain(&e),
  })? {
    file.write_all(&chunk).await.map_err(|source| FetchError::Io {
      path: dest.to_path_buf(),
      source,
    })?;
    written += chunk.len() as u64;
  }

  file.flush().await.map_err(|source| FetchError::Io {
    path: dest.to_path_buf(),
    source,
  })?;

  Ok(written)
}

async fn copy_local(url: &Url, dest: &Path) -> Result<u64, FetchError> {
  let source_path = url.to_file_path().map_err(|_| FetchError::InvalidUrl {
    url: url.to_string(),
    message: "not a local file path".to_string(),
  })?;
  debug!(source = ?source_path, "copying local bala");

  let mut source = fs::File::open(&source_path).await.map_err(|e| FetchError::Unreachable {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  let mut file = fs::File::create(dest).await.map_err(|source| FetchError::Io {
    path: dest.to_path_buf(),
    source,
  })?;

  let written = tokio::io::copy(&mut source, &mut file)
    .await
    .map_err(|source| FetchError::Io {
      path: dest.to_path_buf(),
      source,
    })?;

  file.flush().await.map_err(|source| FetchError::Io {
    path: dest.to_path_buf(),
    source,
  })?;

  Ok(written)
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
  let mut message = err.to_string();
  let mut source = err.source();
  while let Some(cause) = source {
    message.push_str(": ");
    message.push_str(&cause.to_string());
    source = cause.source();
  }
  message
}
