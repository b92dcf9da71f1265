//! The C toolchain used to produce the entry library.
//!
//! The compiler is injected rather than looked up at each call site, so callers
//! (and tests) can point the pipeline at any program that accepts gcc-style
//! arguments.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

use crate::consts::{COMMON_FLAGS, DEFAULT_CC};

/// A program and its arguments, ready to be spawned.
///
/// Arguments are kept as `OsString` so paths reach the compiler byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: OsString,
  pub args: Vec<OsString>,
}

impl CommandSpec {
  pub fn new(program: impl Into<OsString>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.to_string_lossy())?;
    for arg in &self.args {
      write!(f, " {}", arg.to_string_lossy())?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  /// Compiler program name or path.
  pub cc: OsString,
}

impl Default for Toolchain {
  fn default() -> Self {
    Self::new(DEFAULT_CC)
  }
}

impl Toolchain {
  pub fn new(cc: impl Into<OsString>) -> Self {
    Self { cc: cc.into() }
  }

  pub fn cc(&self) -> &OsStr {
    &self.cc
  }

  fn base(&self) -> CommandSpec {
    CommandSpec::new(&self.cc).args(COMMON_FLAGS.iter().copied())
  }

  /// `<cc> <flags> -fPIC -c <source> -o <object> -rdynamic`
  pub fn compile_command(&self, source: &Path, object: &str) -> CommandSpec {
    self
      .base()
      .args(["-fPIC", "-c"])
      .arg(source)
      .args(["-o", object, "-rdynamic"])
  }

  /// `<cc> <flags> -shared -o <library> <object> -rdynamic`
  pub fn link_command(&self, object: &str, library: &str) -> CommandSpec {
    self.base().args(["-shared", "-o", library, object, "-rdynamic"])
  }
}
