//! Workflow sync: propagate the canonical `pcb-release.yml` to an
//! organization's recently updated repositories through pull requests.
//!
//! Each repository is handled independently; a failure in one is reported
//! and the run moves on to the next.

pub mod checks;
pub mod github;
pub mod repo;

use crate::cli::RuntimeConfig;
use crate::error::{ReleaseError, Result, SyncError};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub use checks::{CheckRun, CheckState, CheckSummary};
pub use github::{PullRequestView, RepoSummary};
pub use repo::{CloneStatus, LocalRepo, PullRequestOutcome, WorkflowStatus};

/// Repositories never touched by sync
pub const DEFAULT_EXCLUDED: &[&str] = &["stdlib", "diodelib", "legacy-demo", "customer"];

/// Settings for one sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Organization or user owning the repositories
    pub owner: String,
    /// Maximum repositories to process
    pub limit: usize,
    /// Only repositories updated within this many days
    pub days: i64,
    /// Where clones live
    pub work_dir: PathBuf,
    /// Canonical workflow file
    pub source_workflow: PathBuf,
    /// Auto-merge PRs whose checks all passed
    pub merge_passing: bool,
    /// Repository names to skip
    pub excluded: HashSet<String>,
}

/// Outcome of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Repositories processed without error
    pub processed: usize,
    /// Repositories selected
    pub selected: usize,
    /// `(owner/name, PR outcome)` for each PR opened or reused
    pub pull_requests: Vec<(String, PullRequestOutcome)>,
    /// PRs merged by this run
    pub merged: usize,
}

/// Run the sync
pub async fn run_sync(options: &SyncOptions, config: &RuntimeConfig) -> Result<SyncReport> {
    if !options.source_workflow.is_file() {
        return Err(ReleaseError::Sync(SyncError::SourceWorkflowMissing {
            path: options.source_workflow.clone(),
        }));
    }

    let cutoff = updated_since(options.days, Utc::now());
    config.println(&format!(
        "Fetching {} repositories updated since: {}",
        options.owner,
        cutoff.to_rfc3339()
    ));

    let repos = github::list_repos(&options.owner).await?;
    let repos = github::filter_repos(repos, &options.excluded, cutoff, options.limit);
    display_repos(&repos, options.days, config);

    std::fs::create_dir_all(&options.work_dir)?;
    config.section(&format!("Setting up repositories in {}", options.work_dir.display()));

    let mut report = SyncReport {
        selected: repos.len(),
        ..SyncReport::default()
    };

    for summary in &repos {
        let local = LocalRepo::new(summary, &options.work_dir);
        match sync_repo(&local, &options.source_workflow, config).await {
            Ok(pr) => {
                report.processed += 1;
                if let Some(pr) = pr {
                    report.pull_requests.push((local.full_name.clone(), pr));
                }
            }
            Err(e) => {
                log::debug!("sync of {} failed: {e:?}", local.full_name);
                config.error_println(&format!("{}: {e}", summary.name));
            }
        }
    }

    config.success_println(&format!(
        "Processed {}/{} repositories successfully",
        report.processed, report.selected
    ));

    if report.pull_requests.is_empty() {
        config.println("No pull requests were created (no changes needed)");
        return Ok(report);
    }

    config.section(&format!("Created {} pull requests", report.pull_requests.len()));
    for (name, pr) in &report.pull_requests {
        config.indent(&format!("• {name}: {}", pr.describe()));
    }

    config.section("PR Status Summary");
    report_pr_statuses(&report.pull_requests, config).await;

    if options.merge_passing {
        config.section("Auto-merging PRs with passing checks");
        report.merged = merge_passing(&report.pull_requests, config).await;
        if report.merged > 0 {
            config.success_println(&format!(
                "Auto-merged {} PRs with passing checks",
                report.merged
            ));
        } else {
            config.println("No PRs were auto-merged (no PRs with all checks passed)");
        }
    }

    Ok(report)
}

/// Oldest update time still selected. Look-backs reaching past the
/// representable range select everything.
pub fn updated_since(days: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

async fn sync_repo(
    local: &LocalRepo,
    source_workflow: &Path,
    config: &RuntimeConfig,
) -> Result<Option<PullRequestOutcome>> {
    let clone_status = local.clone_or_update().await?;
    let workflow_status = local.update_workflow(source_workflow).await?;

    let mut status = clone_status.label().to_string();
    if workflow_status == WorkflowStatus::Committed {
        status.push_str(", workflow updated & committed");
    }
    config.success_println(&format!("{}: {status}", local.full_name));

    if workflow_status != WorkflowStatus::Committed {
        return Ok(None);
    }

    let pr = local.open_pull_request().await?;
    config.indent(&format!("→ PR for {}: {}", local.full_name, pr.describe()));
    Ok(Some(pr))
}

fn display_repos(repos: &[RepoSummary], days: i64, config: &RuntimeConfig) {
    if repos.is_empty() {
        config.println(&format!("No repositories updated in the last {days} days."));
        return;
    }

    let now = Utc::now();
    let width = repos
        .iter()
        .map(|r| r.name_with_owner.len())
        .max()
        .unwrap_or(0);
    for repo in repos {
        config.indent(&format!(
            "{:<width$}  {:>8}  {:<12}  {}",
            repo.name_with_owner,
            github::format_age(repo.updated_at, now),
            repo.language(),
            repo.short_description(),
        ));
    }
}

async fn report_pr_statuses(prs: &[(String, PullRequestOutcome)], config: &RuntimeConfig) {
    for (name, pr) in prs {
        let Some(number) = github::pr_number(&pr.url) else {
            config.warning_println(&format!("{name}: cannot read PR number from {}", pr.url));
            continue;
        };

        match github::view_pr(name, number).await {
            Ok(view) if !view.is_open() => {}
            Ok(view) => {
                let summary = CheckSummary::from_checks(&view.status_check_rollup);
                config.indent(&format!("{name}  {}  {}", pr.url, summary.describe()));
            }
            Err(ReleaseError::Json(_)) => {
                config.error_println(&format!("{name}  {}  Parse error", pr.url));
            }
            Err(_) => {
                config.error_println(&format!("{name}  {}  Failed to get status", pr.url));
            }
        }
    }
}

async fn merge_passing(prs: &[(String, PullRequestOutcome)], config: &RuntimeConfig) -> usize {
    let mut merged = 0;
    for (name, pr) in prs {
        let Some(number) = github::pr_number(&pr.url) else {
            continue;
        };

        let view = match github::view_pr(name, number).await {
            Ok(view) => view,
            Err(e) => {
                config.error_println(&format!("Error processing PR data for {name}: {e}"));
                continue;
            }
        };

        if !view.is_open() || !view.is_mergeable() {
            continue;
        }
        if !CheckSummary::from_checks(&view.status_check_rollup).all_passed() {
            continue;
        }

        match github::merge_pr(name, number).await {
            Ok(()) => {
                config.success_println(&format!("Merged PR for {name}"));
                merged += 1;
            }
            Err(e) => config.error_println(&format!("Failed to merge PR for {name}: {e}")),
        }
    }
    merged
}

/// Run a command, returning stdout; non-zero exit becomes [`SyncError::CommandFailed`].
pub(crate) async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<String> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    capture(program, args, command).await
}

pub(crate) async fn run_command_env(
    program: &str,
    args: &[&str],
    env: &[(&str, &str)],
) -> Result<String> {
    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    capture(program, args, command).await
}

/// Run a command and report only whether it succeeded
pub(crate) async fn run_status(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

async fn capture(program: &str, args: &[&str], mut command: Command) -> Result<String> {
    let command_line = format!("{program} {}", args.join(" "));
    log::debug!("Running: {command_line}");

    let output = command.output().await.map_err(|e| {
        ReleaseError::Sync(SyncError::CommandFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })
    })?;

    if !output.status.success() {
        return Err(ReleaseError::Sync(SyncError::CommandFailed {
            command: command_line,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn run_command_captures_stdout_and_failures() {
        let out = run_command("sh", &["-c", "echo hello"], None).await.unwrap();
        assert_eq!(out, "hello\n");

        let err = run_command("sh", &["-c", "echo nope >&2; exit 1"], None)
            .await
            .unwrap_err();
        match err {
            ReleaseError::Sync(SyncError::CommandFailed { reason, .. }) => {
                assert_eq!(reason, "nope")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(run_status("sh", &["-c", "exit 0"]).await);
        assert!(!run_status("sh", &["-c", "exit 2"]).await);
    }

    #[test]
    fn cutoff_clamps_huge_look_backs() {
        let now = Utc::now();
        assert_eq!(updated_since(30, now), now - TimeDelta::days(30));
        assert_eq!(updated_since(0, now), now);
        assert_eq!(updated_since(100_000_000, now), DateTime::<Utc>::MIN_UTC);
        assert_eq!(updated_since(i64::MAX, now), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn run_sync_requires_source_workflow() {
        let dir = TempDir::new().unwrap();
        let options = SyncOptions {
            owner: "dioderobot".to_string(),
            limit: 3,
            days: 30,
            work_dir: dir.path().join("work"),
            source_workflow: dir.path().join(".github/workflows/pcb-release.yml"),
            merge_passing: false,
            excluded: HashSet::new(),
        };

        let err = run_sync(&options, &RuntimeConfig::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Sync(SyncError::SourceWorkflowMissing { .. })
        ));
        assert!(!dir.path().join("work").exists());
    }
}
