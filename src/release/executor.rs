//! Version-control operations for a bump: commit and annotated tag.
//!
//! [`GitCli`] shells out to the system `git` binary, inheriting the user's
//! git config, hooks and signing setup. Tag lookups go through `git2`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use tracing::debug;

use crate::error::VcsError;

/// Commit and tag capability used by the bump pipeline.
///
/// This abstraction allows mocking version control in tests.
#[cfg_attr(test, mockall::automock)]
pub trait VersionControl {
    /// Whether a tag with this exact name exists.
    fn tag_exists(&self, name: &str) -> Result<bool, VcsError>;

    /// Stage `files` and create a commit with `message`.
    fn commit(&self, message: &str, files: &[PathBuf]) -> Result<(), VcsError>;

    /// Create an annotated tag on HEAD.
    fn tag(&self, name: &str, message: &str) -> Result<(), VcsError>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Use the repository containing `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run a git command in the working directory.
    fn run_git<I, S>(&self, args: I, operation: &str) -> Result<(), VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        which::which("git").map_err(|_| VcsError::NotInstalled)?;
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        debug!(args = ?args, "Running git");

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| VcsError::GitFailed(format!("Failed to run git {}: {}", operation, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VcsError::GitFailed(format!(
                "git {} failed: {}",
                operation,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl VersionControl for GitCli {
    fn tag_exists(&self, name: &str) -> Result<bool, VcsError> {
        let repo = Repository::discover(&self.workdir).map_err(|source| {
            VcsError::OpenRepository {
                path: self.workdir.clone(),
                source,
            }
        })?;

        let tags = repo
            .tag_names(Some(name))
            .map_err(|e| VcsError::GitFailed(format!("Failed to list tags: {}", e)))?;

        Ok(tags.iter().flatten().any(|t| t == name))
    }

    /// Only `files` end up in the commit; anything else already staged
    /// stays staged.
    fn commit(&self, message: &str, files: &[PathBuf]) -> Result<(), VcsError> {
        if files.is_empty() {
            return Err(VcsError::GitFailed("No files to stage".into()));
        }
        let paths = files.iter().map(|p| p.as_os_str());

        let add_args = [OsStr::new("add"), OsStr::new("--")];
        self.run_git(add_args.into_iter().chain(paths.clone()), "stage files")?;

        let commit_args = [
            OsStr::new("commit"),
            OsStr::new("-m"),
            OsStr::new(message),
            OsStr::new("--"),
        ];
        self.run_git(commit_args.into_iter().chain(paths), "create commit")
    }

    fn tag(&self, name: &str, message: &str) -> Result<(), VcsError> {
        self.run_git(&["tag", "-a", name, "-m", message], "create tag")
    }
}
