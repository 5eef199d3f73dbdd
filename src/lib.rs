//! bump_version - A CLI tool for bumping semantic versions in Bash scripts and updating changelogs.
//!
//! # Overview
//!
//! bump_version tracks the current version of a project in a `.version` file,
//! computes the next semantic version, rewrites the `VERSION="x.y.z"`
//! declaration in target Bash scripts, records a dated entry in CHANGELOG.md
//! and can commit and tag the result with git.

pub mod atomic;
pub mod changelog;
pub mod config;
pub mod error;
pub mod release;
pub mod version;

// Re-export commonly used types
pub use changelog::{ChangelogEntry, ChangelogPosition};
pub use config::Config;
pub use error::{BumpError, ChangelogError, ConfigError, StoreError, TargetError, VcsError, VersionError};
pub use release::{BumpReport, BumpRequest, BumpSettings, Outcome, run_bump};
pub use version::{BumpKind, VersionStore};
