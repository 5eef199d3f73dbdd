//! Optional `.bump_version.toml` configuration.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;

use crate::changelog::ChangelogPosition;
use crate::error::ConfigError;
use crate::release::BumpSettings;
use crate::version::VersionStore;
use crate::version::store::DEFAULT_VERSION_FILE;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = ".bump_version.toml";

/// Settings for a repository. Every key is optional in the file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the version-tracking file.
    pub version_file: PathBuf,

    /// Version assumed when the version file does not exist yet.
    pub default_version: Version,

    /// Changelog to update.
    pub changelog: PathBuf,

    /// Set to false to never touch the changelog.
    pub update_changelog: bool,

    pub changelog_position: ChangelogPosition,

    /// Prefix for release tags (`v` gives `v1.2.3`).
    pub tag_prefix: String,

    /// Commit and tag after a bump.
    pub commit: bool,

    /// Commit message template. `{version}` and `{tag}` are substituted.
    pub commit_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version_file: PathBuf::from(DEFAULT_VERSION_FILE),
            default_version: Version::new(0, 0, 0),
            changelog: PathBuf::from("CHANGELOG.md"),
            update_changelog: true,
            changelog_position: ChangelogPosition::Top,
            tag_prefix: "v".to_string(),
            commit: false,
            commit_message: "chore(release): {tag}".to_string(),
        }
    }
}

impl Config {
    /// Pipeline settings derived from this config.
    pub fn bump_settings(&self) -> BumpSettings {
        BumpSettings {
            changelog: self.update_changelog.then(|| self.changelog.clone()),
            changelog_position: self.changelog_position,
            tag_prefix: self.tag_prefix.clone(),
            commit_message: self.commit_message.clone(),
        }
    }

    pub fn version_store(&self) -> VersionStore {
        VersionStore::new(self.version_file.clone(), self.default_version.clone())
    }
}

/// Loads configuration from file or returns defaults.
///
/// With an explicit `config_path` the file must exist. Otherwise
/// `.bump_version.toml` in the current directory is used when present.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(CONFIG_FILE), false),
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            return Ok(Config::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    parse_config(&path, &content)
}

/// Parse configuration text. `path` is only used in error messages.
pub fn parse_config(path: &Path, content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
