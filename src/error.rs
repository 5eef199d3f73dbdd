//! Error types for bump_version modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from parsing semantic versions.
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Empty version string (expected MAJOR.MINOR.PATCH)")]
    Empty,

    #[error("Invalid version '{input}': {source} (expected MAJOR.MINOR.PATCH[-suffix])")]
    Parse {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("Cannot apply a {kind} bump to {version}: component would overflow")]
    Overflow { version: String, kind: String },
}

/// Errors from the `.version` file store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read version file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write version file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version file {path} is malformed: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: VersionError,
    },

    #[error(
        "Another bump is in progress ({path} exists). If no other bump_version is running, delete the lock file and retry."
    )]
    Locked { path: PathBuf },

    #[error("Failed to create lock file {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from changelog operations.
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Failed to read changelog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write changelog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized changelog structure in {path}: {reason}")]
    Unrecognized { path: PathBuf, reason: String },

    #[error("Version {version} already exists in changelog {path}")]
    VersionAlreadyExists { path: PathBuf, version: String },
}

/// Errors from rewriting the version declaration in a target script.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error(
        "No version declaration found in {path} (expected a line like VERSION=\"1.2.3\")"
    )]
    NotFound { path: PathBuf },

    #[error("Failed to read target {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write target {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TargetError {
    /// The target file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path } | Self::Read { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

/// Errors from the version-control collaborator.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git executable not found in PATH")]
    NotInstalled,

    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("{0}")]
    GitFailed(String),

    #[error("Tag {0} already exists")]
    TagAlreadyExists(String),
}

/// Errors from loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal errors from the bump pipeline. Nothing has been written when one of
/// these is returned before the target patch step.
#[derive(Error, Debug)]
pub enum BumpError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Changelog(#[from] ChangelogError),
}
