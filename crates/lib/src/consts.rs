pub const APP_NAME: &str = "gdxb";

/// Compiler used when neither `--cc` nor `GDXB_CC` is given.
pub const DEFAULT_CC: &str = "gcc";

/// Flags shared by the compile and link invocations.
pub const COMMON_FLAGS: &[&str] = &["-g", "-Wall", "-Wl,--no-as-needed"];

pub const OBJECT_FILE: &str = "entry.o";
pub const LIBRARY_FILE: &str = "entry.so";

/// Destination of the final library, relative to the work dir.
pub const DEFAULT_OUT_DIR: &str = "mvp-godot-project/build";

pub const LOCK_FILENAME: &str = ".gdxb.lock";

/// Printed to stdout when any pipeline step fails.
pub const FAILURE_MESSAGE: &str = "Exiting because of nonzero return code";

pub const ENV_CC: &str = "GDXB_CC";
pub const ENV_OUT_DIR: &str = "GDXB_OUT_DIR";
