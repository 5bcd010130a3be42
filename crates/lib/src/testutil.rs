//! Test helpers for baladoc-lib.
//!
//! Builds bala archives and fake toolchain installations on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

/// Writes a zip archive at `path` containing the given `(name, content)` entries.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
  let file = File::create(path).unwrap();
  let mut writer = zip::ZipWriter::new(file);
  for (name, content) in entries {
    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap();
}

/// Writes a bala whose `package.json` declares `ballerina_version`.
pub fn write_bala(path: &Path, ballerina_version: &str) {
  let manifest = format!(
    r#"{{"organization":"testorg","name":"greeter","version":"0.1.0","ballerina_version":"{}"}}"#,
    ballerina_version
  );
  write_zip(path, &[("package.json", manifest.as_str()), ("modules/greeter/main.bal", "")]);
}

/// Creates an installation directory under `dists` with a `bal` script.
///
/// The script records its arguments into `<installation>/invocations` and
/// exits with `exit_code`.
#[cfg(unix)]
pub fn fake_toolchain(dists: &Path, name: &str, exit_code: i32) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let root = dists.join(name);
  let bin_dir = root.join("bin");
  fs::create_dir_all(&bin_dir).unwrap();

  let script = format!(
    "#!/bin/sh\necho \"$@\" >> \"{}\"\nexit {}\n",
    root.join("invocations").display(),
    exit_code
  );
  let bin = bin_dir.join("bal");
  fs::write(&bin, script).unwrap();
  fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
  root
}

/// Lines recorded by a [`fake_toolchain`] script, empty if it never ran.
pub fn invocations(toolchain_root: &Path) -> Vec<String> {
  fs::read_to_string(toolchain_root.join("invocations"))
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
