//! Version declarations in Bash scripts.
//!
//! A declaration is a single assignment line such as
//!
//! ```text
//! VERSION="1.2.3"
//! readonly SCRIPT_VERSION='0.4.0'  # bumped by bump_version
//! export VERSION=2.0.0-rc.1
//! ```
//!
//! The variable is `VERSION` or an upper-case name ending in `_VERSION`, and
//! the value is quoted with matching quotes or unquoted. Only the first such
//! line in a file is rewritten. This is a line-oriented text rule, not a Bash
//! parser: values built from other variables, here-docs and `declare -x`
//! combinations other than those above are not recognized.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex_lite::Regex;
use semver::Version;
use tracing::debug;

use crate::atomic::write_atomic;
use crate::error::TargetError;

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[ \t]*(?:(?:export|readonly|local|declare(?:[ \t]+-[a-zA-Z]+)*)[ \t]+)?",
        r"(?:[A-Z][A-Z0-9_]*_)?VERSION=",
        r#"(?P<open>["']?)"#,
        r"(?P<version>[0-9]+\.[0-9]+\.[0-9]+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)",
        r#"(?P<close>["']?)"#,
        r"(?:[ \t;#].*)?$",
    ))
    .expect("Invalid regex")
});

/// A recognized version declaration within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// 1-based line number.
    pub line_number: usize,
    /// Byte range of the version text within the whole file.
    pub start: usize,
    pub end: usize,
    /// The version text as currently written.
    pub current: String,
}

/// Result of updating one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUpdate {
    pub path: PathBuf,
    pub line_number: usize,
    pub previous: String,
}

/// Find the first version declaration in `content`.
pub fn find_declaration(content: &str) -> Option<Declaration> {
    let mut offset = 0;

    for (index, raw) in content.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw.len();

        let line = raw.trim_end_matches(['\n', '\r']);
        let Some(caps) = DECLARATION_RE.captures(line) else {
            continue;
        };

        let open = caps.name("open").map_or("", |m| m.as_str());
        let close = caps.name("close").map_or("", |m| m.as_str());
        if open != close {
            continue;
        }

        let Some(version) = caps.name("version") else {
            continue;
        };

        return Some(Declaration {
            line_number: index + 1,
            start: line_start + version.start(),
            end: line_start + version.end(),
            current: version.as_str().to_string(),
        });
    }

    None
}

/// Replace the version text of `declaration`, keeping every other byte.
pub fn rewrite_declaration(content: &str, declaration: &Declaration, version: &Version) -> String {
    let mut out = String::with_capacity(content.len() + 8);
    out.push_str(&content[..declaration.start]);
    out.push_str(&version.to_string());
    out.push_str(&content[declaration.end..]);
    out
}

/// Locate the declaration in a target without modifying it.
pub fn inspect_target(path: &Path) -> Result<Declaration, TargetError> {
    let content = read_file(path)?;
    find_declaration(&content).ok_or_else(|| TargetError::NotFound {
        path: path.to_path_buf(),
    })
}

/// Rewrite the declaration in `path` to `version`.
pub fn update_target(path: &Path, version: &Version) -> Result<TargetUpdate, TargetError> {
    let content = read_file(path)?;
    let declaration = find_declaration(&content).ok_or_else(|| TargetError::NotFound {
        path: path.to_path_buf(),
    })?;

    let updated = rewrite_declaration(&content, &declaration, version);
    write_atomic(path, updated.as_bytes()).map_err(|source| TargetError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        line = declaration.line_number,
        from = %declaration.current,
        to = %version,
        "Updated version declaration"
    );

    Ok(TargetUpdate {
        path: path.to_path_buf(),
        line_number: declaration.line_number,
        previous: declaration.current,
    })
}

fn read_file(path: &Path) -> Result<String, TargetError> {
    std::fs::read_to_string(path).map_err(|source| TargetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rewrite(content: &str, version: &str) -> Option<String> {
        let decl = find_declaration(content)?;
        Some(rewrite_declaration(content, &decl, &Version::parse(version).unwrap()))
    }

    #[test]
    fn test_double_quoted() {
        assert_eq!(
            rewrite("#!/bin/bash\nVERSION=\"1.2.3\"\necho hi\n", "1.3.0").unwrap(),
            "#!/bin/bash\nVERSION=\"1.3.0\"\necho hi\n"
        );
    }

    #[test]
    fn test_single_quoted_with_prefix_and_comment() {
        assert_eq!(
            rewrite("  readonly SCRIPT_VERSION='0.4.0'  # keep in sync\n", "0.5.0").unwrap(),
            "  readonly SCRIPT_VERSION='0.5.0'  # keep in sync\n"
        );
    }

    #[test]
    fn test_unquoted_export_with_suffix() {
        assert_eq!(
            rewrite("export VERSION=2.0.0-rc.1\n", "2.0.0").unwrap(),
            "export VERSION=2.0.0\n"
        );
    }

    #[test]
    fn test_declare_readonly() {
        assert_eq!(
            rewrite("declare -r VERSION=\"1.0.0\"\n", "1.0.1").unwrap(),
            "declare -r VERSION=\"1.0.1\"\n"
        );
    }

    #[test]
    fn test_only_first_declaration_rewritten() {
        let content = "VERSION=\"1.0.0\"\nOTHER_VERSION=\"1.0.0\"\n";
        assert_eq!(
            rewrite(content, "1.1.0").unwrap(),
            "VERSION=\"1.1.0\"\nOTHER_VERSION=\"1.0.0\"\n"
        );
    }

    #[test]
    fn test_crlf_and_no_trailing_newline_preserved() {
        assert_eq!(
            rewrite("echo start\r\nVERSION=\"1.0.0\"\r\necho end", "1.0.1").unwrap(),
            "echo start\r\nVERSION=\"1.0.1\"\r\necho end"
        );
    }

    #[test]
    fn test_rejects_non_matching_lines() {
        for content in [
            "version=\"1.0.0\"\n",
            "MYVERSION=\"1.0.0\"\n",
            "VERSION=\"1.0.0'\n",
            "VERSION=\"1.0\"\n",
            "VERSION=\"$(cat .version)\"\n",
            "echo VERSION=\"1.0.0\"\n",
            "# VERSION=\"1.0.0\"\n",
            "VERSION=1.0.0abc\n",
        ] {
            assert!(find_declaration(content).is_none(), "matched {content:?}");
        }
    }

    #[test]
    fn test_declaration_line_number() {
        let decl = find_declaration("#!/bin/bash\n\nVERSION=\"3.1.4\"\n").unwrap();
        assert_eq!(decl.line_number, 3);
        assert_eq!(decl.current, "3.1.4");
    }

    #[test]
    fn test_update_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.sh");
        fs::write(&path, "#!/usr/bin/env bash\nVERSION=\"0.5.3\"\n").unwrap();

        let update = update_target(&path, &Version::new(0, 6, 0)).unwrap();

        assert_eq!(update.previous, "0.5.3");
        assert_eq!(update.line_number, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "#!/usr/bin/env bash\nVERSION=\"0.6.0\"\n"
        );
    }

    #[test]
    fn test_update_target_without_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.sh");
        fs::write(&path, "#!/bin/bash\necho hello\n").unwrap();

        let err = update_target(&path, &Version::new(1, 0, 0)).unwrap_err();
        assert!(matches!(err, TargetError::NotFound { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/bash\necho hello\n");
    }

    #[test]
    fn test_update_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let err = update_target(&dir.path().join("nope.sh"), &Version::new(1, 0, 0)).unwrap_err();
        assert!(matches!(err, TargetError::Read { .. }));
    }
}
