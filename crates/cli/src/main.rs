mod cmd;
mod output;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use gdxb_lib::PipelineError;
use gdxb_lib::consts::{APP_NAME, DEFAULT_CC, DEFAULT_OUT_DIR, ENV_CC, ENV_OUT_DIR, FAILURE_MESSAGE};

use cmd::BuildArgs;
use output::{OutputFormat, print_error, usage_line};

/// gdxb - build a GDExtension entry library from a single C source file
#[derive(Parser)]
#[command(name = "gdxb")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// C source file to compile (relative to the work dir)
  source: PathBuf,

  /// Compiler to invoke for both compiling and linking (empty means gcc)
  #[arg(long, env = ENV_CC, default_value = DEFAULT_CC)]
  cc: OsString,

  /// Directory the finished entry.so is moved into (empty means the default)
  #[arg(long, env = ENV_OUT_DIR, default_value = DEFAULT_OUT_DIR)]
  out_dir: PathBuf,

  /// Run the build from this directory
  #[arg(short = 'C', long, default_value = ".")]
  work_dir: PathBuf,

  /// Print the steps without running them
  #[arg(long)]
  dry_run: bool,

  /// Do not take the work dir lock (.gdxb.lock, deleted when the build ends)
  #[arg(long)]
  no_lock: bool,

  /// Report format
  #[arg(short, long, value_enum, default_value_t)]
  output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> ExitCode {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
    Err(e) => {
      let program = std::env::args_os()
        .next()
        .map_or_else(|| APP_NAME.to_string(), |p| p.to_string_lossy().into_owned());
      println!("{}", usage_line(&program));
      eprint!("{}", e.render());
      return ExitCode::FAILURE;
    }
  };

  init_tracing(cli.verbose);

  let args = BuildArgs {
    source: cli.source,
    cc: or_default(cli.cc, DEFAULT_CC),
    out_dir: or_default(cli.out_dir.into_os_string(), DEFAULT_OUT_DIR).into(),
    work_dir: cli.work_dir,
    dry_run: cli.dry_run,
    lock: !cli.no_lock,
    output: cli.output,
    verbose: cli.verbose,
  };

  match cmd::cmd_build(args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      if let Some(PipelineError::StepFailed { .. }) = err.downcast_ref::<PipelineError>() {
        println!("{}", FAILURE_MESSAGE);
      } else {
        print_error(&format!("{:#}", err));
      }
      ExitCode::FAILURE
    }
  }
}

// An exported but empty GDXB_CC or GDXB_OUT_DIR counts as unset.
fn or_default(value: OsString, default: &str) -> OsString {
  if value.is_empty() { OsString::from(default) } else { value }
}

// Stdout and stderr belong to the compiler unless -v or RUST_LOG ask for logs.
fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
