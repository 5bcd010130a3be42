//! Implementation of the `baladoc inspect` command.

use std::path::Path;

use anyhow::{Context, Result};

use baladoc_lib::archive::read_manifest;

use crate::output::{OutputFormat, format_size, print_json, print_stat, print_success};

pub fn cmd_inspect(bala: &Path, output: OutputFormat) -> Result<()> {
  let manifest = read_manifest(bala).with_context(|| format!("Failed to read bala: {}", bala.display()))?;
  let size = std::fs::metadata(bala).map(|m| m.len()).unwrap_or_default();

  if output.is_json() {
    return print_json(&serde_json::json!({
      "path": bala,
      "size_bytes": size,
      "manifest": manifest,
      "toolchain_version": manifest.toolchain_version(),
    }));
  }

  let name = match (&manifest.organization, &manifest.name) {
    (Some(org), Some(name)) => format!("{}/{}", org, name),
    (None, Some(name)) => name.clone(),
    _ => bala.display().to_string(),
  };

  print_success(&name);
  print_stat("Version", manifest.version.as_deref().unwrap_or("-"));
  print_stat("Platform", manifest.platform.as_deref().unwrap_or("-"));
  print_stat("Ballerina", manifest.ballerina_version.as_deref().unwrap_or("-"));
  print_stat("Toolchain", manifest.toolchain_version().unwrap_or("-"));
  print_stat("Size", &format_size(size));

  Ok(())
}
