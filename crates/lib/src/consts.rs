//! Fixed names shared across the pipeline.

/// Manifest entry every bala carries at the archive root.
pub const MANIFEST_ENTRY: &str = "package.json";

/// Largest manifest we are willing to read, whatever the zip header claims.
pub const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// Default root holding one directory per installed distribution.
pub const DEFAULT_DISTS_DIR: &str = "/dists";

/// Toolchain executable, relative to an installation root.
#[cfg(not(windows))]
pub const TOOLCHAIN_BIN: &str = "bin/bal";

#[cfg(windows)]
pub const TOOLCHAIN_BIN: &str = "bin/bal.bat";

pub const DOC_SUBCOMMAND: &str = "doc";

/// Prefix of every per-request workspace directory.
pub const WORKSPACE_PREFIX: &str = "bala-";

/// Output directory name inside a workspace.
pub const DOCS_DIR_NAME: &str = "target";

pub const ENV_DISTS_DIR: &str = "BALADOC_DISTS_DIR";
pub const ENV_TEMP_DIR: &str = "BALADOC_TEMP_DIR";
pub const ENV_FETCH_TIMEOUT: &str = "BALADOC_FETCH_TIMEOUT";
pub const ENV_PROCESS_TIMEOUT: &str = "BALADOC_PROCESS_TIMEOUT";
pub const ENV_STRICT_EXIT: &str = "BALADOC_STRICT_EXIT";
