//! Bump kinds and version increments.

use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};

use crate::error::VersionError;

/// Type of version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl BumpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            _ => Err(format!(
                "Unknown bump kind '{}' (expected major, minor or patch)",
                s
            )),
        }
    }
}

/// Apply a bump to a version.
///
/// Lower components reset to zero. Pre-release and build metadata are
/// dropped, so `1.2.3-rc.1` patch-bumps to `1.2.4`. Fails with
/// [`VersionError::Overflow`] when the bumped component is already `u64::MAX`.
pub fn increment(version: &Version, kind: BumpKind) -> Result<Version, VersionError> {
    let overflow = || VersionError::Overflow {
        version: version.to_string(),
        kind: kind.to_string(),
    };

    let mut next = match kind {
        BumpKind::Major => Version::new(version.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
        BumpKind::Minor => Version::new(
            version.major,
            version.minor.checked_add(1).ok_or_else(overflow)?,
            0,
        ),
        BumpKind::Patch => Version::new(
            version.major,
            version.minor,
            version.patch.checked_add(1).ok_or_else(overflow)?,
        ),
    };
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}
