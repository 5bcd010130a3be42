//! Shared helpers for pipeline integration tests.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use baladoc_lib::{BuildConfig, BuildPipeline};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Isolated temp root and dists root for one test.
pub struct TestEnv {
  pub temp_root: TempDir,
  pub dists: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp_root: TempDir::new().unwrap(),
      dists: TempDir::new().unwrap(),
    }
  }

  pub fn config(&self) -> BuildConfig {
    BuildConfig {
      dists_dir: self.dists.path().to_path_buf(),
      temp_root: self.temp_root.path().to_path_buf(),
      ..BuildConfig::default()
    }
  }

  pub fn pipeline(&self) -> BuildPipeline {
    BuildPipeline::new(self.config())
  }

  /// Entries left in the temp root; zero once every workspace is released.
  pub fn leftovers(&self) -> Vec<PathBuf> {
    fs::read_dir(self.temp_root.path())
      .unwrap()
      .map(|e| e.unwrap().path())
      .collect()
  }

  /// Install a fake distribution whose `bal` logs its arguments.
  #[cfg(unix)]
  pub fn install_toolchain(&self, name: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let root = self.dists.path().join(name);
    fs::create_dir_all(root.join("bin")).unwrap();
    let script = format!(
      "#!/bin/sh\necho \"$@\" >> \"{}\"\nexit {}\n",
      root.join("invocations").display(),
      exit_code
    );
    let bin = root.join("bin").join("bal");
    fs::write(&bin, script).unwrap();
    fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
    root
  }
}

/// Lines logged by a fake distribution.
pub fn invocations(toolchain_root: &Path) -> Vec<String> {
  fs::read_to_string(toolchain_root.join("invocations"))
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}

/// Bytes of a bala declaring `ballerina_version`.
pub fn bala_bytes(ballerina_version: &str) -> Vec<u8> {
  let manifest = format!(
    r#"{{"organization":"wso2","name":"greeter","version":"1.2.0","ballerina_version":"{}"}}"#,
    ballerina_version
  );
  zip_bytes(&[("package.json", manifest.as_str()), ("docs/Package.md", "# greeter")])
}

pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
  let temp = TempDir::new().unwrap();
  let path = temp.path().join("archive.zip");
  let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
  for (name, content) in entries {
    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap();
  fs::read(&path).unwrap()
}
