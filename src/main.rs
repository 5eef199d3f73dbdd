//! bump_version - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use semver::Version;
use tracing_subscriber::EnvFilter;

use bump_version::changelog::ChangelogPosition;
use bump_version::config::load_config;
use bump_version::release::executor::{GitCli, VersionControl};
use bump_version::release::{BumpReport, BumpRequest, Outcome, VcsOutcome, run_bump};
use bump_version::version::{BumpKind, VersionOrigin};

/// Exit code when nothing was changed because of an error.
const EXIT_FATAL: u8 = 1;
/// Exit code when the version was bumped but some targets or the commit/tag failed.
const EXIT_PARTIAL: u8 = 3;

/// Bump semantic versions in Bash scripts and update changelogs.
#[derive(Parser, Debug)]
#[command(name = "bump_version")]
#[command(about = "Bump semantic versions in Bash scripts and update changelogs")]
#[command(after_help = "Example:\n  bump_version script.sh --minor")]
#[command(version)]
struct Cli {
    /// Bash scripts whose VERSION="x.y.z" line should be updated
    targets: Vec<PathBuf>,

    /// Bump the major version (x.0.0)
    #[arg(long)]
    major: bool,

    /// Bump the minor version (x.y.0)
    #[arg(long)]
    minor: bool,

    /// Bump the patch version (x.y.z+1)
    #[arg(long)]
    patch: bool,

    /// Set an explicit version (must be greater than the current one)
    #[arg(long = "set-version", value_name = "VERSION")]
    set_version: Option<Version>,

    /// Changelog message for this release
    #[arg(short, long)]
    message: Option<String>,

    /// Commit the changed files and create an annotated tag
    #[arg(long, overrides_with = "no_commit")]
    commit: bool,

    /// Do not commit or tag, even if enabled in the config file
    #[arg(long, overrides_with = "commit")]
    no_commit: bool,

    /// Prefix for the release tag
    #[arg(long)]
    tag_prefix: Option<String>,

    /// Path to the version-tracking file
    #[arg(long)]
    version_file: Option<PathBuf>,

    /// Path to the changelog file
    #[arg(long)]
    changelog: Option<PathBuf>,

    /// Do not update the changelog
    #[arg(long, conflicts_with = "changelog")]
    no_changelog: bool,

    /// Where new changelog sections go
    #[arg(long, value_enum)]
    changelog_position: Option<ChangelogPosition>,

    /// Path to a config file (default: .bump_version.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the current version and exit
    #[arg(long)]
    current: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Partial) => ExitCode::from(EXIT_PARTIAL),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "bump_version=debug"
    } else {
        "bump_version=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<Outcome> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // CLI flags override the config file
    if let Some(path) = cli.version_file {
        config.version_file = path;
    }
    if let Some(path) = cli.changelog {
        config.changelog = path;
    }
    if cli.no_changelog {
        config.update_changelog = false;
    }
    if let Some(position) = cli.changelog_position {
        config.changelog_position = position;
    }
    if let Some(prefix) = cli.tag_prefix {
        config.tag_prefix = prefix;
    }
    if cli.commit {
        config.commit = true;
    }
    if cli.no_commit {
        config.commit = false;
    }

    let store = config.version_store();

    if cli.current {
        let stored = store.load()?;
        println!("{}", stored.version);
        if stored.origin == VersionOrigin::Default {
            eprintln!("(no {} yet, showing default)", store.path().display());
        }
        return Ok(Outcome::Success);
    }

    let mut kinds = Vec::new();
    if cli.major {
        kinds.push(BumpKind::Major);
    }
    if cli.minor {
        kinds.push(BumpKind::Minor);
    }
    if cli.patch {
        kinds.push(BumpKind::Patch);
    }

    let request = BumpRequest {
        kinds,
        explicit_version: cli.set_version,
        targets: cli.targets,
        message: cli.message,
        dry_run: cli.dry_run,
        date: None,
    };

    let git = GitCli::new(".");
    let vcs: Option<&dyn VersionControl> = if config.commit { Some(&git) } else { None };

    let report = run_bump(&store, vcs, &config.bump_settings(), &request)?;
    print_report(&report, &store.path().display().to_string());

    Ok(report.outcome())
}

fn print_report(report: &BumpReport, version_file: &str) {
    let origin = match report.origin {
        VersionOrigin::File => String::new(),
        VersionOrigin::Default => " (no version file, default)".to_string(),
    };
    println!("Version: {} -> {}{}", report.previous, report.next, origin);

    let done = if report.dry_run { "PLAN" } else { "DONE" };

    for update in &report.updated_targets {
        println!(
            "  [{}] {}: line {}: {} -> {}",
            done,
            update.path.display(),
            update.line_number,
            update.previous,
            report.next
        );
    }
    for failure in &report.target_failures {
        eprintln!("  [FAIL] {}", failure);
    }

    if let Some(record) = &report.changelog {
        if let Some(warning) = &record.warning {
            eprintln!("  [WARN] {}", warning);
        }
        println!(
            "  [{}] {}: {}",
            done,
            record.path.display(),
            record.outcome.describe()
        );
    }

    for failure in &report.persist_failures {
        eprintln!("  [FAIL] {}", failure);
    }
    if report.persist_failures.is_empty() {
        println!("  [{}] {}: {}", done, version_file, report.next);
    }

    match &report.vcs {
        VcsOutcome::Skipped => {}
        VcsOutcome::Planned { tag, message } | VcsOutcome::Committed { tag, message } => {
            println!("  [{}] Commit: {}", done, message);
            println!("  [{}] Tag: {}", done, tag);
        }
        VcsOutcome::Failed(e) => {
            eprintln!("  [WARN] Version control: {}", e);
            eprintln!("         The version bump itself was written and is not rolled back.");
        }
    }

    if report.dry_run {
        println!();
        println!("Dry run complete. No changes made.");
    } else if !report.persist_failures.is_empty() {
        eprintln!();
        eprintln!(
            "Bump to {} is incomplete; fix the errors above and reconcile the files by hand.",
            report.next
        );
    } else if !report.target_failures.is_empty() {
        eprintln!();
        eprintln!(
            "Bumped to {} with {} target(s) not updated.",
            report.next,
            report.target_failures.len()
        );
    }
}
