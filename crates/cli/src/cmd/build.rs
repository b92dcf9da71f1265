//! Implementation of the build command.
//!
//! Compiles a single C source file into `entry.so` and moves it into the
//! engine project's build directory, stopping at the first failing step.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use gdxb_lib::{BuildOptions, BuildReport, BuildRequest, Toolchain, pipeline};

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_success, symbols};

/// Inputs for [`cmd_build`], already resolved from flags and environment.
pub struct BuildArgs {
  pub source: PathBuf,
  pub cc: OsString,
  pub out_dir: PathBuf,
  pub work_dir: PathBuf,
  pub dry_run: bool,
  pub lock: bool,
  pub output: OutputFormat,
  pub verbose: bool,
}

/// Execute the build.
///
/// Runs the pipeline on a current-thread runtime; each step is awaited before
/// the next starts. Errors are returned untouched so `main` can map step
/// failures to the fixed failure message.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let request = BuildRequest::new(args.source);
  let options = BuildOptions {
    toolchain: Toolchain::new(args.cc),
    work_dir: args.work_dir,
    out_dir: args.out_dir,
    dry_run: args.dry_run,
    lock: args.lock,
  };

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;
  let report = rt.block_on(pipeline::run(&request, &options))?;

  if args.output.is_json() {
    return print_json(&report);
  }

  if report.dry_run {
    print_plan(&report);
  } else if args.verbose {
    print_success(&format!(
      "Built {} in {}",
      report.artifact.display(),
      format_duration(report.total_elapsed())
    ));
  }

  info!(artifact = %report.artifact.display(), "artifact ready");
  Ok(())
}

fn print_plan(report: &BuildReport) {
  print_info(&format!("Dry run: {} step(s) for {}", report.steps.len(), report.source.display()));
  for (i, step) in report.steps.iter().enumerate() {
    println!("  {}. {} {} {}", i + 1, step.step, symbols::ARROW, step.command);
  }
}
