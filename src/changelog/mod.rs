//! Changelog parsing and writing.

pub mod format;
pub mod parser;
pub mod writer;

pub use format::{CHANGELOG_HEADER, ChangelogEntry, ChangelogPosition};
pub use parser::{ParsedChangelog, read_changelog};
pub use writer::{
    AppendOutcome, append_entry, ensure_version_absent, ensure_writable, render_with_entry,
    write_entry,
};
