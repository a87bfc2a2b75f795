//! Local clone management and workflow file updates.

use super::{github, run_command, run_command_env, run_status};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Branch carrying the workflow update
pub const SYNC_BRANCH: &str = "update-workflow-pcb-release";

/// Repository-relative location of the release workflow
pub const WORKFLOW_PATH: &str = ".github/workflows/pcb-release.yml";

/// Commit message and PR title
pub const COMMIT_TITLE: &str = "Update GitHub workflow: pcb-release.yml";

/// PR body
pub const PR_BODY: &str =
    "This PR updates the pcb-release.yml workflow file to the latest version.";

const BOT_NAME: &str = "Diode Robot";
const BOT_EMAIL: &str = "info@diode.run";

/// How the local clone was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatus {
    /// Fresh clone
    Cloned,
    /// Existing clone reset to origin/main
    Updated,
}

impl CloneStatus {
    /// Short label for listings
    pub fn label(&self) -> &'static str {
        match self {
            CloneStatus::Cloned => "cloned",
            CloneStatus::Updated => "updated",
        }
    }
}

/// Result of comparing and updating the workflow file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    /// Already identical, nothing committed
    UpToDate,
    /// Update committed on the sync branch
    Committed,
}

/// A PR carrying the workflow update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestOutcome {
    /// PR URL
    pub url: String,
    /// Whether it was created by this run
    pub created: bool,
    /// Whether new commits were pushed to it
    pub pushed: bool,
}

impl PullRequestOutcome {
    /// Description for listings
    pub fn describe(&self) -> String {
        match (self.created, self.pushed) {
            (true, _) => self.url.clone(),
            (false, true) => format!("{} (updated existing PR)", self.url),
            (false, false) => format!("{} (existing PR, no changes)", self.url),
        }
    }
}

/// A repository checked out under the work directory
#[derive(Debug, Clone)]
pub struct LocalRepo {
    /// `owner/name`
    pub full_name: String,
    /// Checkout path
    pub path: PathBuf,
}

impl LocalRepo {
    /// Checkout location of `repo` under `work_dir`
    pub fn new(repo: &github::RepoSummary, work_dir: &Path) -> Self {
        Self {
            full_name: repo.name_with_owner.clone(),
            path: work_dir.join(&repo.name),
        }
    }

    fn git_dir(&self) -> String {
        self.path.display().to_string()
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let dir = self.git_dir();
        let mut full = vec!["-C", dir.as_str()];
        full.extend_from_slice(args);
        run_command("git", &full, None).await
    }

    /// Clone, or fetch and hard-reset an existing clone to `origin/main`
    pub async fn clone_or_update(&self) -> Result<CloneStatus> {
        if self.path.exists() {
            self.git(&["fetch", "origin"]).await?;
            self.git(&["checkout", "main"]).await?;
            self.git(&["reset", "--hard", "origin/main"]).await?;
            return Ok(CloneStatus::Updated);
        }

        let url = format!("https://github.com/{}.git", self.full_name);
        let dest = self.git_dir();
        run_command("git", &["clone", url.as_str(), dest.as_str()], None).await?;
        Ok(CloneStatus::Cloned)
    }

    /// Copy `source` over the repo's workflow and commit it on the sync branch
    /// when it differs.
    pub async fn update_workflow(&self, source: &Path) -> Result<WorkflowStatus> {
        let target = self.path.join(WORKFLOW_PATH);
        if target.exists() && files_identical(source, &target)? {
            return Ok(WorkflowStatus::UpToDate);
        }

        self.git(&["checkout", "main"]).await?;
        // The branch may not exist yet.
        let dir = self.git_dir();
        let _ = run_status("git", &["-C", dir.as_str(), "branch", "-D", SYNC_BRANCH]).await;
        self.git(&["checkout", "-b", SYNC_BRANCH]).await?;

        // Checkout may have pruned the now-empty workflow directory.
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, &target)?;
        self.git(&["add", WORKFLOW_PATH]).await?;

        let staged = self.git(&["diff", "--name-only", "--cached"]).await?;
        if staged.trim().is_empty() {
            self.git(&["checkout", "main"]).await?;
            self.git(&["branch", "-d", SYNC_BRANCH]).await?;
            return Ok(WorkflowStatus::UpToDate);
        }

        let env = [
            ("GIT_AUTHOR_NAME", BOT_NAME),
            ("GIT_AUTHOR_EMAIL", BOT_EMAIL),
            ("GIT_COMMITTER_NAME", BOT_NAME),
            ("GIT_COMMITTER_EMAIL", BOT_EMAIL),
        ];
        run_command_env(
            "git",
            &["-C", dir.as_str(), "commit", "-m", COMMIT_TITLE],
            &env,
        )
        .await?;

        Ok(WorkflowStatus::Committed)
    }

    /// Push the sync branch if it changed and make sure a PR exists for it
    pub async fn open_pull_request(&self) -> Result<PullRequestOutcome> {
        let remote_branch = format!("origin/{SYNC_BRANCH}");
        // A missing remote branch counts as a change.
        let pushed = match self.git(&["diff", remote_branch.as_str(), SYNC_BRANCH]).await {
            Ok(diff) => !diff.trim().is_empty(),
            Err(_) => true,
        };

        if pushed {
            self.git(&["push", "--force-with-lease", "origin", SYNC_BRANCH])
                .await?;
        }

        if let Some(url) = github::find_pr(&self.full_name, SYNC_BRANCH, &self.path).await? {
            return Ok(PullRequestOutcome {
                url,
                created: false,
                pushed,
            });
        }

        let url = github::create_pr(
            &self.full_name,
            SYNC_BRANCH,
            COMMIT_TITLE,
            PR_BODY,
            &self.path,
        )
        .await?;

        Ok(PullRequestOutcome {
            url,
            created: true,
            pushed,
        })
    }
}

fn files_identical(a: &Path, b: &Path) -> std::io::Result<bool> {
    Ok(std::fs::read(a)? == std::fs::read(b)?)
}
