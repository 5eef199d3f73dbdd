//! Persistence of the current version in a `.version` file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::debug;

use crate::atomic::{check_writable, write_atomic};
use crate::error::StoreError;

use super::lock::StoreLock;
use super::semantic::{format_version, parse_version};

/// Default name of the version-tracking file.
pub const DEFAULT_VERSION_FILE: &str = ".version";

/// Where a loaded version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrigin {
    /// Read from the version file.
    File,
    /// The version file does not exist yet; the configured default was used.
    Default,
}

/// A version as returned by [`VersionStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVersion {
    pub version: Version,
    pub origin: VersionOrigin,
}

/// Owner of the version file. `load` and `save` are its only access points.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
    default_version: Version,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>, default_version: Version) -> Self {
        Self {
            path: path.into(),
            default_version,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file (`<version file>.lock`).
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_VERSION_FILE.into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Take the advisory lock for a load-modify-save sequence.
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        StoreLock::acquire(&self.lock_path())
    }

    /// Read the current version.
    ///
    /// A missing file is not an error: the default is returned with
    /// [`VersionOrigin::Default`] so the caller can seed the file.
    pub fn load(&self) -> Result<StoredVersion, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), default = %self.default_version, "No version file, using default");
                return Ok(StoredVersion {
                    version: self.default_version.clone(),
                    origin: VersionOrigin::Default,
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let version = parse_version(&content).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), version = %version, "Loaded version");
        Ok(StoredVersion {
            version,
            origin: VersionOrigin::File,
        })
    }

    /// Fail early if [`save`](Self::save) could not write the version file.
    pub fn check_writable(&self) -> Result<(), StoreError> {
        check_writable(&self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically overwrite the version file.
    pub fn save(&self, version: &Version) -> Result<(), StoreError> {
        let content = format!("{}\n", format_version(version));
        write_atomic(&self.path, content.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), version = %version, "Saved version");
        Ok(())
    }
}
