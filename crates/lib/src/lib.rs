//! gdxb-lib: build pipeline for GDExtension entry libraries.
//!
//! This crate provides the pieces the `gdxb` binary is made of:
//! - `Toolchain`: the injected compiler and its fixed flag set
//! - `pipeline`: the ordered, fail-fast list of build steps and its runner
//! - `lock`: an advisory lock guarding the fixed artifact names in a work dir

pub mod consts;
pub mod lock;
pub mod pipeline;
pub mod toolchain;
pub mod util;

pub use lock::{BuildLock, BuildLockError};
pub use pipeline::{BuildOptions, BuildReport, BuildRequest, PipelineError, Step, StepError, plan, run};
pub use toolchain::{CommandSpec, Toolchain};
