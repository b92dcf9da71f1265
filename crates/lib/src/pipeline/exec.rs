//! Execution of individual pipeline steps.
//!
//! Subprocesses inherit stdio so compiler diagnostics reach the terminal
//! unmodified. Filesystem steps run in-process.

use std::io;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{Step, StepError};
use crate::toolchain::CommandSpec;

pub async fn execute_step(step: &Step, work_dir: &Path) -> Result<(), StepError> {
  match step {
    Step::Compile(cmd) | Step::Link(cmd) => run_command(cmd, work_dir).await,
    Step::RemoveObject { path } => tokio::fs::remove_file(path).await.map_err(|e| io_err(path, e)),
    Step::CreateOutputDir { path } => tokio::fs::create_dir_all(path).await.map_err(|e| io_err(path, e)),
    Step::MoveLibrary { from, to } => move_file(from, to).await,
  }
}

/// Run a command to completion and check its exit status.
pub async fn run_command(cmd: &CommandSpec, work_dir: &Path) -> Result<(), StepError> {
  debug!(program = ?cmd.program, args = ?cmd.args, work_dir = ?work_dir, "spawning process");

  let status = Command::new(&cmd.program)
    .args(&cmd.args)
    .current_dir(work_dir)
    .status()
    .await
    .map_err(|source| StepError::Spawn {
      program: cmd.program.to_string_lossy().into_owned(),
      source,
    })?;

  if !status.success() {
    return Err(StepError::NonZeroExit { code: status.code() });
  }

  Ok(())
}

/// Move `from` to `to`, replacing any existing file.
///
/// `rename` cannot cross filesystems; in that case the file is copied and the
/// source removed afterwards.
pub async fn move_file(from: &Path, to: &Path) -> Result<(), StepError> {
  match tokio::fs::rename(from, to).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
      warn!(from = ?from, to = ?to, "rename crosses devices, copying instead");
      tokio::fs::copy(from, to).await.map_err(|e| io_err(to, e))?;
      tokio::fs::remove_file(from).await.map_err(|e| io_err(from, e))
    }
    Err(e) => Err(io_err(from, e)),
  }
}

fn io_err(path: &Path, source: io::Error) -> StepError {
  StepError::Io {
    path: path.to_path_buf(),
    source,
  }
}
