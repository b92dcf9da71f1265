//! Shared test helpers for CLI integration tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Compiler stand-in that writes a placeholder to the `-o` target.
pub const WORKING_CC: &str = r#"#!/bin/sh
echo "fake-cc $*"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
echo fake > "$out"
"#;

pub const FAILING_CC: &str = r#"#!/bin/sh
echo "foo.c:1:1: error: expected declaration" >&2
exit 1
"#;

pub const LINK_FAILING_CC: &str = r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "-shared" ]; then
    echo "ld: undefined reference to 'godot_init'" >&2
    exit 1
  fi
done
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
echo fake > "$out"
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary work dir holding the source file and a
/// fake compiler; the binary runs with that dir as its cwd.
pub struct TestEnv {
  pub temp: TempDir,
  pub cc: PathBuf,
}

impl TestEnv {
  pub fn with_cc(script: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let cc = temp.path().join("fake-cc");
    std::fs::write(&cc, script).unwrap();
    std::fs::set_permissions(&cc, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(temp.path().join("foo.c"), "void entry(void) {}\n").unwrap();
    Self { temp, cc }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn artifact(&self) -> PathBuf {
    self.path().join("mvp-godot-project").join("build").join("entry.so")
  }

  /// Get a pre-configured Command for the gdxb binary.
  ///
  /// Runs in the temp dir with `GDXB_CC` pointing at the fake compiler.
  pub fn gdxb_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("gdxb");
    cmd.current_dir(self.path());
    cmd.env("GDXB_CC", &self.cc);
    cmd.env_remove("GDXB_OUT_DIR");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
