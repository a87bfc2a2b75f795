//! `gh` CLI wrappers used by workflow sync.

use super::checks::CheckRun;
use super::run_command;
use crate::error::{ReleaseError, Result, SyncError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Repositories requested from `gh repo list`, before filtering
const LIST_FETCH_LIMIT: &str = "100";

/// Descriptions longer than this are shortened in listings
const DESCRIPTION_WIDTH: usize = 60;

/// Repository as reported by `gh repo list --json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    /// Short name
    pub name: String,
    /// `owner/name`
    pub name_with_owner: String,
    /// Last update
    pub updated_at: DateTime<Utc>,
    /// Description, if set
    #[serde(default)]
    pub description: Option<String>,
    /// Web URL
    #[serde(default)]
    pub url: String,
    /// Primary language, if detected
    #[serde(default)]
    pub primary_language: Option<Language>,
}

/// Language entry of a repository
#[derive(Debug, Clone, Deserialize)]
pub struct Language {
    /// Language name
    pub name: String,
}

impl RepoSummary {
    /// Primary language name or `N/A`
    pub fn language(&self) -> &str {
        self.primary_language
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or("N/A")
    }

    /// Description shortened for listings
    pub fn short_description(&self) -> String {
        let description = self
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description");
        if description.chars().count() > DESCRIPTION_WIDTH {
            let cut: String = description.chars().take(DESCRIPTION_WIDTH - 3).collect();
            format!("{cut}...")
        } else {
            description.to_string()
        }
    }
}

/// PR fields read by `gh pr view --json`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestView {
    /// PR title
    #[serde(default)]
    pub title: String,
    /// OPEN, CLOSED, MERGED
    #[serde(default)]
    pub state: String,
    /// MERGEABLE, CONFLICTING, UNKNOWN
    #[serde(default)]
    pub mergeable: String,
    /// Check runs and status contexts
    #[serde(default)]
    pub status_check_rollup: Vec<CheckRun>,
}

impl PullRequestView {
    /// Whether the PR is still open
    pub fn is_open(&self) -> bool {
        self.state.eq_ignore_ascii_case("OPEN")
    }

    /// Whether GitHub reports the PR as mergeable
    pub fn is_mergeable(&self) -> bool {
        self.mergeable.eq_ignore_ascii_case("MERGEABLE")
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestRef {
    url: String,
}

/// Keep repos updated at or after `cutoff`, skipping excluded names, up to `limit`.
///
/// Result is sorted newest first.
pub fn filter_repos(
    repos: Vec<RepoSummary>,
    excluded: &HashSet<String>,
    cutoff: DateTime<Utc>,
    limit: usize,
) -> Vec<RepoSummary> {
    let mut kept: Vec<RepoSummary> = repos
        .into_iter()
        .filter(|repo| !excluded.contains(&repo.name))
        .filter(|repo| repo.updated_at >= cutoff)
        .take(limit)
        .collect();
    kept.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    kept
}

/// Relative age like `5m ago`, `3h ago` or `2d ago`
pub fn format_age(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now - updated_at;
    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}m ago", age.num_minutes().max(0))
    }
}

/// PR number from a PR URL, ignoring any trailing note
pub fn pr_number(pr_url: &str) -> Option<&str> {
    pr_url
        .split_whitespace()
        .next()?
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// List repositories of `owner`
pub async fn list_repos(owner: &str) -> Result<Vec<RepoSummary>> {
    let stdout = run_command(
        "gh",
        &[
            "repo",
            "list",
            owner,
            "--limit",
            LIST_FETCH_LIMIT,
            "--json",
            "name,nameWithOwner,updatedAt,description,url,primaryLanguage",
        ],
        None,
    )
    .await?;
    Ok(serde_json::from_str(&stdout)?)
}

/// URL of an existing PR for `branch`, if any
pub async fn find_pr(repo: &str, branch: &str, cwd: &Path) -> Result<Option<String>> {
    let stdout = run_command(
        "gh",
        &["pr", "list", "--repo", repo, "--head", branch, "--json", "url"],
        Some(cwd),
    )
    .await?;
    let prs: Vec<PullRequestRef> = serde_json::from_str(&stdout)?;
    Ok(prs.into_iter().next().map(|pr| pr.url))
}

/// Open a PR from `branch` into `main`, returning its URL
pub async fn create_pr(
    repo: &str,
    branch: &str,
    title: &str,
    body: &str,
    cwd: &Path,
) -> Result<String> {
    let stdout = run_command(
        "gh",
        &[
            "pr", "create", "--repo", repo, "--base", "main", "--head", branch, "--title", title,
            "--body", body,
        ],
        Some(cwd),
    )
    .await?;
    let url = stdout.trim().to_string();
    if url.is_empty() {
        return Err(ReleaseError::Sync(SyncError::CommandFailed {
            command: "gh pr create".to_string(),
            reason: "no PR URL returned".to_string(),
        }));
    }
    Ok(url)
}

/// Fetch PR state and checks
pub async fn view_pr(repo: &str, number: &str) -> Result<PullRequestView> {
    let stdout = run_command(
        "gh",
        &[
            "pr",
            "view",
            number,
            "--repo",
            repo,
            "--json",
            "title,state,mergeable,statusCheckRollup",
        ],
        None,
    )
    .await?;
    Ok(serde_json::from_str(&stdout)?)
}

/// Squash-merge a PR once its checks allow
pub async fn merge_pr(repo: &str, number: &str) -> Result<()> {
    run_command(
        "gh",
        &["pr", "merge", number, "--repo", repo, "--squash", "--auto"],
        None,
    )
    .await?;
    Ok(())
}
