//! Advisory single-instance lock.
//!
//! Takes an exclusive, non-blocking `flock(2)` on a file and writes the
//! holder's PID into it. The lock is released when the [`InstanceLock`] is
//! dropped (the descriptor closes); the file itself is left in place.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised while taking the instance lock.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Cannot open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Another instance holds the lock on {path}")]
    Held { path: PathBuf },

    #[error("Failed to lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Held exclusive lock on a file.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Locks `path`, creating it if needed. Fails immediately if another
    /// process holds it.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| LockError::Open {
                path: path.clone(),
                source: e,
            })?;

        // SAFETY: the descriptor is owned by `file` and valid for the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            return Err(if err.kind() == io::ErrorKind::WouldBlock {
                LockError::Held { path }
            } else {
                LockError::Io { path, source: err }
            });
        }

        let write_pid = |file: &mut File| -> io::Result<()> {
            file.set_len(0)?;
            writeln!(file, "{}", std::process::id())?;
            file.flush()
        };
        write_pid(&mut file).map_err(|e| LockError::Io {
            path: path.clone(),
            source: e,
        })?;

        debug!(path = %path.display(), "Instance lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw descriptor backing the lock.
    pub fn as_raw_fd(&self) -> i32 {
        self.file.as_raw_fd()
    }
}
