//! Test utilities for gdxb-lib.
//!
//! Provides stand-in compilers so pipeline tests never depend on a real C
//! toolchain being installed.

use std::path::{Path, PathBuf};

/// Accepts gcc-style arguments and writes a placeholder to the `-o` target.
pub const WORKING_CC: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
[ -n "$out" ] || exit 2
echo fake > "$out"
"#;

/// Fails every invocation, like a compiler hitting a syntax error.
pub const FAILING_CC: &str = r#"#!/bin/sh
echo "fake-cc: error: compilation failed" >&2
exit 1
"#;

/// Compiles fine but fails when asked to link a shared object.
pub const LINK_FAILING_CC: &str = r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "-shared" ]; then
    echo "fake-cc: error: undefined reference" >&2
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

/// Links successfully but never leaves an object file behind.
pub const LIBRARY_ONLY_CC: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
case "$out" in
  *.so) echo fake > "$out" ;;
esac
"#;

/// Write `script` as an executable named `fake-cc` inside `dir`.
pub fn fake_cc(dir: &Path, script: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join("fake-cc");
  std::fs::write(&path, script).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Returns the shell command and args to execute a shell script.
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}
