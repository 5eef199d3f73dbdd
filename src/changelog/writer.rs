//! Insert new version sections into a changelog.

use std::path::Path;

use tracing::debug;

use crate::atomic::{check_writable, write_atomic};
use crate::error::ChangelogError;

use super::format::{CHANGELOG_HEADER, ChangelogEntry, ChangelogPosition};
use super::parser::{ParsedChangelog, find_insertion_point, read_changelog};

/// How an entry ended up in the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The file did not exist and was created with a standard header.
    Created,
    /// Inserted newest-first before the previous release.
    Inserted,
    /// Appended at the end of a recognized changelog.
    Appended,
    /// The structure was not recognized; appended at the end as-is.
    RawAppended,
}

impl AppendOutcome {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Inserted => "inserted at top",
            Self::Appended => "appended at bottom",
            Self::RawAppended => "appended (unrecognized structure)",
        }
    }
}

/// Fail if the changelog already has a section for `entry.version`.
pub fn ensure_version_absent(
    path: &Path,
    existing: Option<&ParsedChangelog>,
    entry: &ChangelogEntry,
) -> Result<(), ChangelogError> {
    match existing {
        Some(parsed) if parsed.has_version(&entry.version) => {
            Err(ChangelogError::VersionAlreadyExists {
                path: path.to_path_buf(),
                version: entry.version.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Fail early if the changelog at `path` could not be written.
pub fn ensure_writable(path: &Path) -> Result<(), ChangelogError> {
    check_writable(path).map_err(|source| ChangelogError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the changelog at `path` and add `entry` to it.
pub fn append_entry(
    path: &Path,
    entry: &ChangelogEntry,
    position: ChangelogPosition,
) -> Result<AppendOutcome, ChangelogError> {
    let existing = read_changelog(path)?;
    write_entry(path, existing.as_ref(), entry, position)
}

/// Add `entry` to an already-read changelog.
///
/// Everything outside the insertion point is written back byte-for-byte.
pub fn write_entry(
    path: &Path,
    existing: Option<&ParsedChangelog>,
    entry: &ChangelogEntry,
    position: ChangelogPosition,
) -> Result<AppendOutcome, ChangelogError> {
    let (content, outcome) = render_with_entry(existing, entry, position);

    if let Some(err) = existing.and_then(|parsed| parsed.structure_error(path)) {
        debug!(error = %err, "Falling back to appending at end of changelog");
    }

    write_atomic(path, content.as_bytes()).map_err(|source| ChangelogError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), version = %entry.version, outcome = outcome.describe(), "Wrote changelog entry");
    Ok(outcome)
}

/// Produce the new changelog text without touching the filesystem.
pub fn render_with_entry(
    existing: Option<&ParsedChangelog>,
    entry: &ChangelogEntry,
    position: ChangelogPosition,
) -> (String, AppendOutcome) {
    let Some(parsed) = existing else {
        let mut content = CHANGELOG_HEADER.to_string();
        content.push_str(&entry.render());
        return (content, AppendOutcome::Created);
    };

    let raw = parsed.raw_content.as_str();
    let newline = if raw.contains("\r\n") { "\r\n" } else { "\n" };
    let section = match newline {
        "\n" => entry.render(),
        _ => entry.render().replace('\n', newline),
    };

    let (insertion_point, outcome) = if !parsed.is_recognized() {
        (raw.len(), AppendOutcome::RawAppended)
    } else {
        match position {
            ChangelogPosition::Top => {
                let point = find_insertion_point(raw);
                if point == raw.len() {
                    (point, AppendOutcome::Appended)
                } else {
                    (point, AppendOutcome::Inserted)
                }
            }
            ChangelogPosition::Bottom => (raw.len(), AppendOutcome::Appended),
        }
    };

    let (before, after) = raw.split_at(insertion_point);

    let mut content = String::with_capacity(raw.len() + section.len() + 4);
    content.push_str(before);
    content.push_str(&separator(before, newline));
    content.push_str(&section);
    if !after.is_empty() {
        content.push_str(newline);
    }
    content.push_str(after);

    (content, outcome)
}

/// Text needed after `before` so that the new section starts after a blank line.
fn separator(before: &str, newline: &str) -> String {
    if before.is_empty() {
        return String::new();
    }
    let double = format!("{newline}{newline}");
    if before.ends_with(&double) {
        String::new()
    } else if before.ends_with(newline) {
        newline.to_string()
    } else {
        double
    }
}
