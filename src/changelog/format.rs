//! Keep a Changelog section formatting.

use chrono::NaiveDate;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Where new version sections go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogPosition {
    /// Newest first: after the header and any `[Unreleased]` section.
    #[default]
    Top,
    /// Appended at the end of the file.
    Bottom,
}

impl ChangelogPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// A single versioned changelog section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub version: Version,
    pub date: NaiveDate,
    pub description: String,
}

impl ChangelogEntry {
    pub fn new(version: Version, date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            version,
            date,
            description: description.into(),
        }
    }

    /// The `## [version] - date` heading line, without newline.
    pub fn heading(&self) -> String {
        format!("## [{}] - {}", self.version, self.date.format("%Y-%m-%d"))
    }

    /// Render the full section, terminated by a single newline.
    ///
    /// Each non-empty description line becomes a bullet; lines that are
    /// already bullets are kept as written.
    pub fn render(&self) -> String {
        let mut section = format!("{}\n\n", self.heading());

        let mut wrote_line = false;
        for line in self.description.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let trimmed = line.trim_start();
            if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
                section.push_str(line);
            } else {
                section.push_str("- ");
                section.push_str(trimmed);
            }
            section.push('\n');
            wrote_line = true;
        }

        if !wrote_line {
            section.push_str(&format!("- Release {}\n", self.version));
        }

        section
    }
}

/// Keep a Changelog header for new files.
pub const CHANGELOG_HEADER: &str = r#"# Changelog

All notable changes to this project will be documented in this file.

The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.1.0/),
and this project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).

"#;
