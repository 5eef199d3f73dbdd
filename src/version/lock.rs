//! Advisory lock file guarding the load-modify-save sequence.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StoreError;

/// Held lock. The lock file is removed on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Create the lock file, failing if another process already holds it.
    pub fn acquire(path: &Path) -> Result<Self, StoreError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::Locked {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(StoreError::Lock {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        // PID is informational only.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            debug!(path = %path.display(), error = %e, "Could not write pid to lock file");
        }

        debug!(path = %path.display(), "Acquired lock");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove lock file");
        }
    }
}
