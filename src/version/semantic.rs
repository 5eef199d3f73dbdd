//! Parsing, formatting and ordering of semantic versions.

use std::cmp::Ordering;

use semver::Version;

use crate::error::VersionError;

/// Parse `MAJOR.MINOR.PATCH[-pre][+build]`, ignoring surrounding whitespace.
pub fn parse_version(text: &str) -> Result<Version, VersionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty);
    }

    Version::parse(trimmed).map_err(|source| VersionError::Parse {
        input: trimmed.to_string(),
        source,
    })
}

/// Render a version in its canonical textual form.
pub fn format_version(version: &Version) -> String {
    version.to_string()
}

/// Compare by SemVer precedence.
///
/// Numeric components are compared first; for equal triples a pre-release
/// sorts before the plain release. Build metadata does not participate.
pub fn compare_versions(a: &Version, b: &Version) -> Ordering {
    a.cmp_precedence(b)
}
