//! Implementation of the `baladoc toolchains` command.
//!
//! Lists installed distributions, or shows which one a version resolves to.

use anyhow::Result;

use baladoc_lib::BuildConfig;
use baladoc_lib::toolchain::ToolchainResolver;

use crate::output::{OutputFormat, print_error, print_info, print_json, print_success, print_toolchain};

pub fn cmd_toolchains(config: &BuildConfig, version: Option<&str>, output: OutputFormat) -> Result<i32> {
  let resolver = ToolchainResolver::new(config.dists_dir.clone());

  let Some(version) = version else {
    let toolchains = resolver.list();
    if output.is_json() {
      print_json(&toolchains)?;
    } else if toolchains.is_empty() {
      print_info(&format!("No distributions installed in {}", config.dists_dir.display()));
    } else {
      for toolchain in &toolchains {
        print_toolchain(toolchain, false);
      }
    }
    return Ok(0);
  };

  match resolver.resolve(version) {
    Some(toolchain) => {
      if output.is_json() {
        print_json(&toolchain)?;
      } else {
        print_success(&format!("{} resolves to {}", version, toolchain.name));
        print_toolchain(&toolchain, true);
      }
      Ok(0)
    }
    None => {
      let message = format!(
        "No distribution for {} in {}",
        version,
        config.dists_dir.display()
      );
      if output.is_json() {
        print_json(&serde_json::json!({ "error": message }))?;
      } else {
        print_error(&message);
      }
      Ok(1)
    }
  }
}
