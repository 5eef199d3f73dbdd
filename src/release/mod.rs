//! Bump pipeline.
//!
//! Loads the current version, computes the next one, rewrites the version
//! declaration in each target script, records a changelog entry, persists the
//! new version and optionally commits and tags it.
//!
//! Each stage finishes its writes before the next begins. Errors before the
//! target stage leave the repository untouched; the changelog and version
//! file are checked for writability there. Once a target has been patched,
//! nothing aborts and failed writes are collected into the report.
//! Commit/tag failures are reported after the fact and never undo the bump.

pub mod executor;
pub mod targets;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use semver::Version;
use tracing::{debug, info};

use crate::changelog::{
    AppendOutcome, ChangelogEntry, ChangelogPosition, ParsedChangelog, ensure_version_absent,
    ensure_writable, read_changelog, render_with_entry, write_entry,
};
use crate::error::{BumpError, ChangelogError, TargetError, VcsError};
use crate::version::{BumpKind, VersionOrigin, VersionStore, compare_versions, increment};

use self::executor::VersionControl;
use self::targets::{TargetUpdate, inspect_target, update_target};

/// What the user asked for. Built from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct BumpRequest {
    /// Requested bump kinds. Exactly one of these or `explicit_version` must be set.
    pub kinds: Vec<BumpKind>,
    pub explicit_version: Option<Version>,
    pub targets: Vec<PathBuf>,
    pub message: Option<String>,
    pub dry_run: bool,
    /// Changelog date; today (UTC) when unset.
    pub date: Option<NaiveDate>,
}

/// Repository-level settings for the pipeline.
#[derive(Debug, Clone)]
pub struct BumpSettings {
    /// Changelog to update, or `None` to leave changelogs alone.
    pub changelog: Option<PathBuf>,
    pub changelog_position: ChangelogPosition,
    /// Prefix for release tags (`v` gives `v1.2.3`).
    pub tag_prefix: String,
    /// Commit message with `{version}` and `{tag}` placeholders.
    pub commit_message: String,
}

impl BumpSettings {
    pub fn tag_name(&self, version: &Version) -> String {
        format!("{}{}", self.tag_prefix, version)
    }

    pub fn commit_message_for(&self, version: &Version) -> String {
        self.commit_message
            .replace("{version}", &version.to_string())
            .replace("{tag}", &self.tag_name(version))
    }
}

impl Default for BumpSettings {
    fn default() -> Self {
        Self {
            changelog: Some(PathBuf::from("CHANGELOG.md")),
            changelog_position: ChangelogPosition::Top,
            tag_prefix: "v".to_string(),
            commit_message: "chore(release): {tag}".to_string(),
        }
    }
}

/// How the next version is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpTarget {
    Kind(BumpKind),
    Explicit(Version),
}

/// Changelog result of a bump.
#[derive(Debug)]
pub struct ChangelogRecord {
    pub path: PathBuf,
    pub outcome: AppendOutcome,
    /// Set when the structure was not recognized and the entry was appended raw.
    pub warning: Option<ChangelogError>,
}

/// Version-control result of a bump.
#[derive(Debug)]
pub enum VcsOutcome {
    /// No version-control collaborator was configured.
    Skipped,
    /// Dry run: what would be committed and tagged.
    Planned { tag: String, message: String },
    Committed { tag: String, message: String },
    Failed(VcsError),
}

/// Overall result, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The version was bumped but some targets or the commit/tag failed.
    Partial,
}

/// Everything a bump did (or, for a dry run, would do).
#[derive(Debug)]
pub struct BumpReport {
    pub previous: Version,
    pub next: Version,
    pub origin: VersionOrigin,
    pub dry_run: bool,
    pub updated_targets: Vec<TargetUpdate>,
    pub target_failures: Vec<TargetError>,
    pub changelog: Option<ChangelogRecord>,
    /// Changelog or version file writes that failed after targets were patched.
    pub persist_failures: Vec<BumpError>,
    pub vcs: VcsOutcome,
}

impl BumpReport {
    pub fn outcome(&self) -> Outcome {
        if !self.target_failures.is_empty()
            || !self.persist_failures.is_empty()
            || matches!(self.vcs, VcsOutcome::Failed(_))
        {
            Outcome::Partial
        } else {
            Outcome::Success
        }
    }
}

/// Check that exactly one way of choosing the next version was requested.
pub fn validate_request(request: &BumpRequest) -> Result<BumpTarget, BumpError> {
    let mut kinds = request.kinds.clone();
    kinds.sort();
    kinds.dedup();

    match (kinds.as_slice(), &request.explicit_version) {
        ([], None) => Err(BumpError::InvalidArgument(
            "No bump requested. Use --major, --minor, --patch or --set-version <VERSION>".into(),
        )),
        ([kind], None) => Ok(BumpTarget::Kind(*kind)),
        ([], Some(version)) => Ok(BumpTarget::Explicit(version.clone())),
        (_, Some(_)) => Err(BumpError::InvalidArgument(
            "--set-version cannot be combined with --major, --minor or --patch".into(),
        )),
        (many, None) => Err(BumpError::InvalidArgument(format!(
            "Conflicting bump kinds requested: {}",
            many.iter()
                .map(|k| format!("--{}", k))
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Compute the next version. It must be strictly greater than `current`.
pub fn compute_next(current: &Version, target: &BumpTarget) -> Result<Version, BumpError> {
    match target {
        BumpTarget::Kind(kind) => Ok(increment(current, *kind)?),
        BumpTarget::Explicit(version) => {
            if compare_versions(version, current).is_gt() {
                Ok(version.clone())
            } else {
                Err(BumpError::InvalidArgument(format!(
                    "Version {} is not greater than the current version {}",
                    version, current
                )))
            }
        }
    }
}

fn default_description(target: &BumpTarget, previous: &Version, next: &Version) -> String {
    match target {
        BumpTarget::Kind(kind) => format!("Bump {} version from {} to {}", kind, previous, next),
        BumpTarget::Explicit(_) => format!("Set version from {} to {}", previous, next),
    }
}

/// Run the full bump pipeline.
///
/// `vcs` enables the commit/tag stage when present.
pub fn run_bump(
    store: &VersionStore,
    vcs: Option<&dyn VersionControl>,
    settings: &BumpSettings,
    request: &BumpRequest,
) -> Result<BumpReport, BumpError> {
    // ── Stage 1: Validate ──
    let target = validate_request(request)?;

    let _lock = if request.dry_run {
        None
    } else {
        Some(store.lock()?)
    };

    // ── Stage 2: Load ──
    let stored = store.load()?;
    if stored.origin == VersionOrigin::Default {
        info!(path = %store.path().display(), default = %stored.version, "No version file yet, starting from default");
    }

    // ── Stage 3: Compute ──
    let next = compute_next(&stored.version, &target)?;
    info!(from = %stored.version, to = %next, "Computed next version");

    let description = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .unwrap_or_else(|| default_description(&target, &stored.version, &next));
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
    let entry = ChangelogEntry::new(next.clone(), date, description);

    // Pre-flight: fail here, before any write, whenever possible.
    let changelog = match &settings.changelog {
        Some(path) => {
            let parsed = read_changelog(path)?;
            ensure_version_absent(path, parsed.as_ref(), &entry)?;
            if !request.dry_run {
                ensure_writable(path)?;
            }
            Some((path.clone(), parsed))
        }
        None => None,
    };
    if !request.dry_run {
        store.check_writable()?;
    }

    let targets = unique_targets(&request.targets);

    if request.dry_run {
        return Ok(plan(
            stored.version,
            stored.origin,
            next,
            &targets,
            changelog,
            &entry,
            vcs.is_some(),
            settings,
        ));
    }

    // ── Stage 4: Patch targets ──
    let mut updated_targets = Vec::new();
    let mut target_failures = Vec::new();
    for path in &targets {
        match update_target(path, &next) {
            Ok(update) => updated_targets.push(update),
            Err(e) => {
                debug!(error = %e, "Target not updated");
                target_failures.push(e);
            }
        }
    }

    // ── Stages 5 and 6: Record changelog, persist ──
    let (changelog, persist_failures) =
        persist(store, changelog, &entry, settings.changelog_position, &next);

    // ── Stage 7: Commit and tag ──
    let vcs = match vcs {
        Some(_) if !persist_failures.is_empty() => {
            debug!("Not committing an incomplete bump");
            VcsOutcome::Skipped
        }
        Some(vcs) => {
            let mut files = vec![store.path().to_path_buf()];
            if let Some(record) = &changelog {
                files.push(record.path.clone());
            }
            files.extend(updated_targets.iter().map(|u| u.path.clone()));

            commit_and_tag(
                vcs,
                &settings.tag_name(&next),
                &settings.commit_message_for(&next),
                &files,
            )
        }
        None => VcsOutcome::Skipped,
    };

    Ok(BumpReport {
        previous: stored.version,
        next,
        origin: stored.origin,
        dry_run: false,
        updated_targets,
        target_failures,
        changelog,
        persist_failures,
        vcs,
    })
}

/// Write the changelog entry and the version file.
///
/// Targets may already carry `next` at this point, so failures are collected
/// for the report instead of aborting.
fn persist(
    store: &VersionStore,
    changelog: Option<(PathBuf, Option<ParsedChangelog>)>,
    entry: &ChangelogEntry,
    position: ChangelogPosition,
    next: &Version,
) -> (Option<ChangelogRecord>, Vec<BumpError>) {
    let mut failures = Vec::new();

    let record = match changelog {
        Some((path, parsed)) => match record_changelog(path, parsed.as_ref(), entry, position) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Changelog not updated");
                failures.push(e);
                None
            }
        },
        None => None,
    };

    if let Err(e) = store.save(next) {
        debug!(error = %e, "Version file not updated");
        failures.push(e.into());
    }

    (record, failures)
}

fn record_changelog(
    path: PathBuf,
    parsed: Option<&ParsedChangelog>,
    entry: &ChangelogEntry,
    position: ChangelogPosition,
) -> Result<ChangelogRecord, BumpError> {
    let outcome = write_entry(&path, parsed, entry, position)?;
    let warning = parsed.and_then(|p| p.structure_error(&path));
    Ok(ChangelogRecord {
        path,
        outcome,
        warning,
    })
}

/// Commit the bumped files and tag the commit. Failures are returned as
/// [`VcsOutcome::Failed`]; nothing already written is undone.
fn commit_and_tag(
    vcs: &dyn VersionControl,
    tag: &str,
    message: &str,
    files: &[PathBuf],
) -> VcsOutcome {
    match vcs.tag_exists(tag) {
        Ok(false) => {}
        Ok(true) => return VcsOutcome::Failed(VcsError::TagAlreadyExists(tag.to_string())),
        Err(e) => return VcsOutcome::Failed(e),
    }

    if let Err(e) = vcs.commit(message, files) {
        debug!(error = %e, "Commit failed");
        return VcsOutcome::Failed(e);
    }

    let tag_message = format!("Release {}", tag);
    if let Err(e) = vcs.tag(tag, &tag_message) {
        debug!(error = %e, "Tag failed");
        return VcsOutcome::Failed(e);
    }

    debug!(tag = %tag, "Committed and tagged");
    VcsOutcome::Committed {
        tag: tag.to_string(),
        message: message.to_string(),
    }
}

/// Build the report for a dry run without writing anything.
#[allow(clippy::too_many_arguments)]
fn plan(
    previous: Version,
    origin: VersionOrigin,
    next: Version,
    targets: &[PathBuf],
    changelog: Option<(PathBuf, Option<ParsedChangelog>)>,
    entry: &ChangelogEntry,
    with_vcs: bool,
    settings: &BumpSettings,
) -> BumpReport {
    let mut updated_targets = Vec::new();
    let mut target_failures = Vec::new();
    for path in targets {
        match inspect_target(path) {
            Ok(decl) => updated_targets.push(TargetUpdate {
                path: path.clone(),
                line_number: decl.line_number,
                previous: decl.current,
            }),
            Err(e) => target_failures.push(e),
        }
    }

    let changelog = changelog.map(|(path, parsed)| {
        let (_, outcome) = render_with_entry(parsed.as_ref(), entry, settings.changelog_position);
        let warning = parsed.as_ref().and_then(|p| p.structure_error(&path));
        ChangelogRecord {
            path,
            outcome,
            warning,
        }
    });

    let vcs = if with_vcs {
        VcsOutcome::Planned {
            tag: settings.tag_name(&next),
            message: settings.commit_message_for(&next),
        }
    } else {
        VcsOutcome::Skipped
    };

    BumpReport {
        previous,
        next,
        origin,
        dry_run: true,
        updated_targets,
        target_failures,
        changelog,
        persist_failures: Vec::new(),
        vcs,
    }
}

/// Drop repeated target paths, keeping first-seen order.
fn unique_targets(targets: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .filter(|p| seen.insert((*p).clone()))
        .cloned()
        .collect()
}
