//! Read an existing changelog and locate insertion points.

use std::io::ErrorKind;
use std::path::Path;

use semver::Version;
use tracing::debug;

use crate::error::ChangelogError;

/// Parsed changelog information.
#[derive(Debug)]
pub struct ParsedChangelog {
    pub has_unreleased: bool,
    /// Version strings of released sections, in document order.
    pub versions: Vec<String>,
    /// Why the structure was not recognized, if it wasn't.
    pub unrecognized: Option<String>,
    pub raw_content: String,
}

impl ParsedChangelog {
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    pub fn has_version(&self, version: &Version) -> bool {
        let wanted = version.to_string();
        self.versions.iter().any(|v| *v == wanted)
    }

    pub fn is_recognized(&self) -> bool {
        self.unrecognized.is_none()
    }

    /// The structure problem as an error, if the changelog wasn't recognized.
    pub fn structure_error(&self, path: &Path) -> Option<ChangelogError> {
        self.unrecognized
            .as_ref()
            .map(|reason| ChangelogError::Unrecognized {
                path: path.to_path_buf(),
                reason: reason.clone(),
            })
    }
}

/// Read and inspect an existing changelog file.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_changelog(path: &Path) -> Result<Option<ParsedChangelog>, ChangelogError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ChangelogError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    Ok(Some(parse_content(content)))
}

/// Inspect changelog text.
pub fn parse_content(content: String) -> ParsedChangelog {
    let headings = section_headings(&content);

    let has_unreleased = headings.iter().any(|(_, h)| is_unreleased(h));
    let versions: Vec<String> = headings
        .iter()
        .filter(|(_, h)| !is_unreleased(h))
        .map(|(_, h)| extract_version_from_title(h.trim_start_matches('#')))
        .collect();

    let unrecognized = check_structure(&content, &versions);
    if let Some(reason) = &unrecognized {
        debug!(reason = %reason, "Changelog structure not recognized");
    }

    ParsedChangelog {
        has_unreleased,
        versions,
        unrecognized,
        raw_content: content,
    }
}

fn check_structure(content: &str, versions: &[String]) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }

    let has_title = content_lines(content).any(|(_, line)| line.starts_with("# "));
    let has_sections = !section_headings(content).is_empty();

    if !has_title && !has_sections {
        return Some("no '# ' title and no '## ' sections".to_string());
    }

    if versions.is_empty() {
        return None;
    }

    let normalized = content.replace("\r\n", "\n");
    match parse_changelog::parse(&normalized) {
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Extract version number from a changelog section title.
/// e.g., "[1.2.3] - 2024-01-01" -> "1.2.3"
fn extract_version_from_title(title: &str) -> String {
    let title = title.trim();

    // Handle [version] format
    if let Some(rest) = title.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[..end].trim().to_string();
        }
    }

    // Handle version - date format
    if let Some(dash_pos) = title.find(" - ") {
        return title[..dash_pos].trim().to_string();
    }

    title.to_string()
}

fn is_unreleased(heading: &str) -> bool {
    heading.to_lowercase().contains("unreleased")
}

/// Lines with their byte offsets, skipping fenced code blocks.
/// Line text excludes the line terminator.
fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    let mut in_fence = false;

    content.split_inclusive('\n').filter_map(move |raw| {
        let start = offset;
        offset += raw.len();

        let line = raw.trim_end_matches(['\n', '\r']);
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            return None;
        }
        if in_fence { None } else { Some((start, line)) }
    })
}

/// Level-2 headings (`## `) with their byte offsets.
fn section_headings(content: &str) -> Vec<(usize, &str)> {
    content_lines(content)
        .filter(|(_, line)| line.starts_with("## "))
        .collect()
}

/// Find the byte offset at which a newest-first section is inserted.
///
/// That is the start of the first released section, skipping any
/// `[Unreleased]` section. Without released sections, the end of the file.
pub fn find_insertion_point(content: &str) -> usize {
    section_headings(content)
        .into_iter()
        .find(|(_, heading)| !is_unreleased(heading))
        .map(|(offset, _)| offset)
        .unwrap_or(content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_version_with_brackets() {
        assert_eq!(extract_version_from_title("[1.2.3] - 2024-01-01"), "1.2.3");
    }

    #[test]
    fn test_extract_version_without_brackets() {
        assert_eq!(extract_version_from_title("1.2.3 - 2024-01-01"), "1.2.3");
    }

    #[test]
    fn test_find_insertion_point_empty() {
        let content = "# Changelog\n\nSome header text.\n";
        let pos = find_insertion_point(content);
        assert_eq!(pos, content.len());
    }

    #[test]
    fn test_find_insertion_point_with_unreleased() {
        let content = "# Changelog\n\n## [Unreleased]\n\n- Some change\n\n## [1.0.0] - 2024-01-01\n";
        let pos = find_insertion_point(content);
        assert!(content[pos..].starts_with("## [1.0.0]"));
    }

    #[test]
    fn test_find_insertion_point_crlf() {
        let content = "# Changelog\r\n\r\n## [1.0.0] - 2024-01-01\r\n\r\n- Initial\r\n";
        let pos = find_insertion_point(content);
        assert!(content[pos..].starts_with("## [1.0.0]"));
    }

    #[test]
    fn test_headings_inside_code_fence_are_ignored() {
        let content = "# Changelog\n\n```\n## [9.9.9] - not a release\n```\n\n## [1.0.0] - 2024-01-01\n";
        let parsed = parse_content(content.to_string());
        assert_eq!(parsed.versions, vec!["1.0.0".to_string()]);
        assert!(content[find_insertion_point(content)..].starts_with("## [1.0.0]"));
    }

    #[test]
    fn test_parse_versions_and_unreleased() {
        let content = "# Changelog\n\n## [Unreleased]\n\n## [1.1.0] - 2024-02-01\n\n- b\n\n## [1.0.0] - 2024-01-01\n\n- a\n";
        let parsed = parse_content(content.to_string());
        assert!(parsed.has_unreleased);
        assert_eq!(parsed.latest_version(), Some("1.1.0"));
        assert!(parsed.has_version(&Version::new(1, 0, 0)));
        assert!(!parsed.has_version(&Version::new(2, 0, 0)));
        assert!(parsed.is_recognized());
    }

    #[test]
    fn test_plain_text_is_unrecognized() {
        let parsed = parse_content("release notes go here\nmore notes\n".to_string());
        assert!(!parsed.is_recognized());
    }

    #[test]
    fn test_empty_is_recognized() {
        assert!(parse_content(String::new()).is_recognized());
    }

    #[test]
    fn test_title_only_is_recognized() {
        assert!(parse_content("# Changelog\n\nNothing yet.\n".to_string()).is_recognized());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_changelog(&dir.path().join("CHANGELOG.md")).unwrap().is_none());
    }
}
