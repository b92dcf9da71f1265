//! Types for planning and running the build pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::consts::{DEFAULT_OUT_DIR, LIBRARY_FILE, OBJECT_FILE};
use crate::lock::BuildLockError;
use crate::toolchain::{CommandSpec, Toolchain};

/// The single input of a build: the C source file to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  source: PathBuf,
}

impl BuildRequest {
  pub fn new(source: impl Into<PathBuf>) -> Self {
    Self { source: source.into() }
  }

  pub fn source(&self) -> &Path {
    &self.source
  }
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  pub toolchain: Toolchain,

  /// Directory the compiler runs in and where `entry.o`/`entry.so` are written.
  pub work_dir: PathBuf,

  /// Destination of the library. Relative paths resolve against `work_dir`.
  pub out_dir: PathBuf,

  /// Plan only; nothing is spawned or touched.
  pub dry_run: bool,

  /// Hold an exclusive lock in `work_dir` for the duration of the run.
  pub lock: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      toolchain: Toolchain::default(),
      work_dir: PathBuf::from("."),
      out_dir: PathBuf::from(DEFAULT_OUT_DIR),
      dry_run: false,
      lock: true,
    }
  }
}

impl BuildOptions {
  pub fn object_path(&self) -> PathBuf {
    self.work_dir.join(OBJECT_FILE)
  }

  pub fn library_path(&self) -> PathBuf {
    self.work_dir.join(LIBRARY_FILE)
  }

  pub fn resolved_out_dir(&self) -> PathBuf {
    if self.out_dir.is_absolute() {
      self.out_dir.clone()
    } else {
      self.work_dir.join(&self.out_dir)
    }
  }

  /// Final location of the library once the pipeline completes.
  pub fn artifact_path(&self) -> PathBuf {
    self.resolved_out_dir().join(LIBRARY_FILE)
  }
}

/// One checkpoint of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  /// Compile the source into `entry.o`.
  Compile(CommandSpec),
  /// Link `entry.o` into `entry.so`.
  Link(CommandSpec),
  /// Delete the intermediate object file.
  RemoveObject { path: PathBuf },
  /// Create the destination directory and its parents.
  CreateOutputDir { path: PathBuf },
  /// Move the library into the destination directory.
  MoveLibrary { from: PathBuf, to: PathBuf },
}

impl Step {
  pub fn name(&self) -> &'static str {
    match self {
      Step::Compile(_) => "compile",
      Step::Link(_) => "link",
      Step::RemoveObject { .. } => "remove-object",
      Step::CreateOutputDir { .. } => "create-output-dir",
      Step::MoveLibrary { .. } => "move-library",
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Step::Compile(cmd) | Step::Link(cmd) => write!(f, "{}", cmd),
      Step::RemoveObject { path } => write!(f, "rm {}", path.display()),
      Step::CreateOutputDir { path } => write!(f, "mkdir -p {}", path.display()),
      Step::MoveLibrary { from, to } => write!(f, "mv {} {}", from.display(), to.display()),
    }
  }
}

/// Why a single step did not complete.
#[derive(Debug, Error)]
pub enum StepError {
  /// The process ran and exited unsuccessfully. `None` means it was killed by a signal.
  #[error("exited with status {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
  NonZeroExit { code: Option<i32> },

  /// The process could not be started at all.
  #[error("failed to launch {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  /// A filesystem step failed.
  #[error("{}: {source}", path.display())]
  Io { path: PathBuf, source: std::io::Error },
}

impl StepError {
  /// Exit code of the failed process, if there was one.
  pub fn exit_code(&self) -> Option<i32> {
    match self {
      StepError::NonZeroExit { code } => *code,
      _ => None,
    }
  }
}

#[derive(Debug, Error)]
pub enum PipelineError {
  /// A step failed; every later step was skipped.
  #[error("step `{step}` failed ({command}): {source}")]
  StepFailed {
    step: &'static str,
    command: String,
    #[source]
    source: StepError,
  },

  #[error(transparent)]
  Lock(#[from] BuildLockError),
}

/// A step that ran to completion.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
  pub step: &'static str,
  pub command: String,
  #[serde(serialize_with = "serialize_millis")]
  pub elapsed: Duration,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub source: PathBuf,
  pub artifact: PathBuf,
  pub dry_run: bool,
  /// Completed steps in order; for a dry run, the planned steps with zero elapsed time.
  pub steps: Vec<StepRecord>,
}

impl BuildReport {
  pub fn total_elapsed(&self) -> Duration {
    self.steps.iter().map(|s| s.elapsed).sum()
  }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
