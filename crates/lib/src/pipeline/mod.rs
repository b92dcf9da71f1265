//! The build pipeline.
//!
//! A build is a fixed, ordered list of steps:
//! 1. compile the source into `entry.o`
//! 2. link `entry.o` into `entry.so`
//! 3. remove `entry.o`
//! 4. create the output directory
//! 5. move `entry.so` into it
//!
//! Steps run one at a time. The first failure stops the run; nothing after it
//! executes and nothing before it is undone.

pub mod exec;
pub mod types;

use std::time::Instant;

use tracing::{debug, error, info};

use crate::consts::{LIBRARY_FILE, OBJECT_FILE};
use crate::lock::BuildLock;

pub use types::{BuildOptions, BuildReport, BuildRequest, PipelineError, Step, StepError, StepRecord};

/// Compute the steps for a build, in execution order.
pub fn plan(request: &BuildRequest, options: &BuildOptions) -> Vec<Step> {
  let toolchain = &options.toolchain;
  vec![
    Step::Compile(toolchain.compile_command(request.source(), OBJECT_FILE)),
    Step::Link(toolchain.link_command(OBJECT_FILE, LIBRARY_FILE)),
    Step::RemoveObject {
      path: options.object_path(),
    },
    Step::CreateOutputDir {
      path: options.resolved_out_dir(),
    },
    Step::MoveLibrary {
      from: options.library_path(),
      to: options.artifact_path(),
    },
  ]
}

/// Run the pipeline for `request`.
///
/// Returns a report of every step on success, or the first failure. With
/// `dry_run` set the plan is returned without executing anything.
pub async fn run(request: &BuildRequest, options: &BuildOptions) -> Result<BuildReport, PipelineError> {
  let steps = plan(request, options);
  let mut report = BuildReport {
    source: request.source().to_path_buf(),
    artifact: options.artifact_path(),
    dry_run: options.dry_run,
    steps: Vec::with_capacity(steps.len()),
  };

  if options.dry_run {
    info!(steps = steps.len(), "dry run, nothing will be executed");
    report.steps = steps
      .iter()
      .map(|step| StepRecord {
        step: step.name(),
        command: step.to_string(),
        elapsed: Default::default(),
      })
      .collect();
    return Ok(report);
  }

  let _lock = if options.lock {
    let lock = BuildLock::acquire(&options.work_dir, &request.source().to_string_lossy())?;
    debug!(path = ?lock.lock_path(), "build lock acquired");
    Some(lock)
  } else {
    None
  };

  info!(source = ?request.source(), cc = ?options.toolchain.cc(), "starting build");

  for step in &steps {
    let command = step.to_string();
    info!(step = step.name(), command = %command, "running step");

    let started = Instant::now();
    if let Err(source) = exec::execute_step(step, &options.work_dir).await {
      error!(step = step.name(), error = %source, "step failed, stopping pipeline");
      return Err(PipelineError::StepFailed {
        step: step.name(),
        command,
        source,
      });
    }

    report.steps.push(StepRecord {
      step: step.name(),
      command,
      elapsed: started.elapsed(),
    });
  }

  info!(artifact = ?report.artifact, "build complete");
  Ok(report)
}
