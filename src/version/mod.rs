//! Semantic versions, bump kinds and the `.version` store.

pub mod bump;
pub mod lock;
pub mod semantic;
pub mod store;

pub use bump::{BumpKind, increment};
pub use lock::StoreLock;
pub use semantic::{compare_versions, format_version, parse_version};
pub use store::{StoredVersion, VersionOrigin, VersionStore};
