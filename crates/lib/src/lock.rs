//! Work-dir lock for a single build.
//!
//! The pipeline writes fixed file names (`entry.o`, `entry.so`) into its work
//! dir, so two builds in the same directory would clobber each other. A build
//! holds an exclusive advisory lock on `.gdxb.lock` for its whole run and
//! deletes the file when it finishes.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::LOCK_FILENAME;

/// Who holds the lock, written into the lock file.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockHolder {
  pub pid: u32,
  pub source: String,
  pub started_at_unix: u64,
}

#[derive(Debug, Error)]
pub enum BuildLockError {
  #[error("pid {pid} is already building {source_file} here (lock: {})", lock_path.display())]
  Busy {
    source_file: String,
    pid: u32,
    lock_path: PathBuf,
  },

  #[error("another build holds {}", lock_path.display())]
  BusyUnknownHolder { lock_path: PathBuf },

  #[error("cannot create {}: {source}", lock_path.display())]
  Create { lock_path: PathBuf, source: io::Error },

  #[error("cannot lock {}: {source}", lock_path.display())]
  Lock { lock_path: PathBuf, source: io::Error },

  #[error("cannot record build in {}: {source}", lock_path.display())]
  Record { lock_path: PathBuf, source: io::Error },
}

/// An exclusive lock on a work dir. Dropping it deletes the lock file.
pub struct BuildLock {
  lock_path: PathBuf,
  // Closed (and the flock released) only after `drop` has unlinked the path.
  _file: File,
}

impl BuildLock {
  /// Take the lock without blocking, recording `source` as the build in progress.
  pub fn acquire(work_dir: &Path, source: &str) -> Result<Self, BuildLockError> {
    let lock_path = work_dir.join(LOCK_FILENAME);
    let mut file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(|source| BuildLockError::Create {
        lock_path: lock_path.clone(),
        source,
      })?;

    match try_lock(&file) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Err(busy(&lock_path)),
      Err(source) => return Err(BuildLockError::Lock { lock_path, source }),
    }

    // A finishing build may have unlinked the file between our open and our lock.
    if !still_linked(&file, &lock_path) {
      return Err(BuildLockError::BusyUnknownHolder { lock_path });
    }

    let holder = LockHolder {
      pid: std::process::id(),
      source: source.to_string(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
    };
    let record = |source| BuildLockError::Record {
      lock_path: lock_path.clone(),
      source,
    };
    file.set_len(0).map_err(record)?;
    serde_json::to_writer(&mut file, &holder).map_err(|e| record(io::Error::other(e)))?;
    file.flush().map_err(record)?;

    debug!(path = ?lock_path, "build lock taken");
    Ok(BuildLock { lock_path, _file: file })
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

impl Drop for BuildLock {
  fn drop(&mut self) {
    if let Err(e) = std::fs::remove_file(&self.lock_path) {
      debug!(path = ?self.lock_path, error = %e, "could not remove build lock");
    }
  }
}

fn busy(lock_path: &Path) -> BuildLockError {
  let holder = std::fs::read_to_string(lock_path)
    .ok()
    .and_then(|contents| serde_json::from_str::<LockHolder>(&contents).ok());

  match holder {
    Some(holder) => BuildLockError::Busy {
      source_file: holder.source,
      pid: holder.pid,
      lock_path: lock_path.to_path_buf(),
    },
    None => BuildLockError::BusyUnknownHolder {
      lock_path: lock_path.to_path_buf(),
    },
  }
}

#[cfg(unix)]
fn still_linked(file: &File, lock_path: &Path) -> bool {
  use std::os::unix::fs::MetadataExt;

  match (file.metadata(), std::fs::metadata(lock_path)) {
    (Ok(held), Ok(on_disk)) => held.dev() == on_disk.dev() && held.ino() == on_disk.ino(),
    _ => false,
  }
}

// Windows refuses to delete a file another handle has open, so the path cannot go stale.
#[cfg(windows)]
fn still_linked(_file: &File, lock_path: &Path) -> bool {
  lock_path.exists()
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};
  use windows_sys::Win32::System::IO::OVERLAPPED;

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: a zeroed OVERLAPPED is valid, and the handle is owned by `file`.
  let locked = unsafe {
    let mut overlapped: OVERLAPPED = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if locked != 0 {
    return Ok(());
  }
  let err = io::Error::last_os_error();
  if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
    Err(io::Error::from(io::ErrorKind::WouldBlock))
  } else {
    Err(err)
  }
}
