//! Command line argument parsing and validation.
//!
//! Every input also reads from the environment so the binary can be driven
//! directly by GitHub Actions `INPUT_*` variables.

use crate::error::{ConfigError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Release .zen board definitions with pcb and collect the archives
#[derive(Parser, Debug)]
#[command(
    name = "pcb-release-action",
    version,
    about = "Release .zen board definitions with pcb and collect the archives",
    long_about = "Resolve board paths, run `pcb release` on each, and collect the
resulting archives for CI.

Usage:
  pcb-release-action release --path boards/Widget
  pcb-release-action batch --paths 'boards/Widget,boards/Gadget'
  pcb-release-action sync-workflows --limit 10 --merge-passing"
)]
pub struct Args {
    /// Workspace root; relative paths are resolved against it
    #[arg(long, global = true, env = "GITHUB_WORKSPACE", value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Only print errors (step outputs are still written)
    #[arg(short, long, global = true, env = "PCB_QUIET")]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Location of the pcb binary
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ToolArgs {
    /// Path (or name) of the pcb binary
    #[arg(long, env = "PCB_BIN", value_name = "PATH")]
    pub pcb_bin: Option<PathBuf>,

    /// Shell command that installs pcb when it cannot be found
    #[arg(long, env = "PCB_INSTALL_COMMAND", value_name = "COMMAND")]
    pub install_command: Option<String>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Release a single target, stopping at the first error
    Release {
        /// Board file, or directory holding exactly one .zen file
        #[arg(long, env = "INPUT_PATH")]
        path: Option<String>,

        /// Also copy the archive into this directory
        #[arg(long, env = "PCB_ARTIFACTS_DIR", value_name = "DIR")]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        tool: ToolArgs,
    },

    /// Release several targets, continuing past per-target failures
    Batch {
        /// Comma or newline separated board files or directories
        #[arg(long, env = "INPUT_PATHS")]
        paths: Option<String>,

        /// Directory collecting renamed archives
        #[arg(long, env = "PCB_ARTIFACTS_DIR", value_name = "DIR", default_value = "artifacts")]
        output_dir: PathBuf,

        #[command(flatten)]
        tool: ToolArgs,
    },

    /// Push the pcb-release workflow to recently updated repositories
    SyncWorkflows {
        /// Organization owning the repositories
        #[arg(long, default_value = "dioderobot")]
        owner: String,

        /// Number of repositories to process
        #[arg(long, default_value_t = 3)]
        limit: usize,

        /// Number of days to look back
        #[arg(long, default_value_t = 30)]
        days: i64,

        /// Work directory for clones
        #[arg(long, default_value = "work", value_name = "DIR")]
        work_dir: PathBuf,

        /// Auto-merge PRs that have all checks passed
        #[arg(long)]
        merge_passing: bool,

        /// Repository names to skip
        #[arg(
            long = "exclude",
            value_delimiter = ',',
            default_values_t = crate::sync::DEFAULT_EXCLUDED.iter().map(|s| s.to_string())
        )]
        excluded: Vec<String>,
    },
}

impl Command {
    /// Subcommand name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Release { .. } => "release",
            Command::Batch { .. } => "batch",
            Command::SyncWorkflows { .. } => "sync-workflows",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Command::SyncWorkflows { limit, days, owner, .. } = &self.command {
            if *limit == 0 {
                return Err("--limit must be at least 1".to_string());
            }
            if *days < 0 {
                return Err("--days must not be negative".to_string());
            }
            if owner.trim().is_empty() {
                return Err("--owner must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Absolute workspace root (`--workspace`, `GITHUB_WORKSPACE`, or the current directory)
    pub fn workspace_root(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        let root = match &self.workspace {
            Some(path) if !path.as_os_str().is_empty() => crate::release::absolute_path(path, &cwd),
            _ => cwd,
        };

        if !root.is_dir() {
            return Err(ConfigError::InvalidWorkspace { path: root }.into());
        }

        Ok(root)
    }
}

/// Console output settings for a run
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new() -> Self {
        Self::with_quiet(false)
    }

    /// Configuration for the parsed command line
    pub fn from_args(args: &Args) -> Self {
        Self::with_quiet(args.quiet)
    }

    fn with_quiet(quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(quiet),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn batch_defaults_output_dir() {
        let args = Args::try_parse_from(["pcb-release-action", "batch", "--paths", "a,b"]).unwrap();
        match args.command {
            Command::Batch { paths, output_dir, .. } => {
                assert_eq!(paths.as_deref(), Some("a,b"));
                assert_eq!(output_dir, PathBuf::from("artifacts"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sync_defaults_and_validation() {
        let args = Args::try_parse_from(["pcb-release-action", "sync-workflows"]).unwrap();
        match &args.command {
            Command::SyncWorkflows { owner, limit, days, excluded, .. } => {
                assert_eq!(owner, "dioderobot");
                assert_eq!(*limit, 3);
                assert_eq!(*days, 30);
                assert_eq!(excluded, &["stdlib", "diodelib", "legacy-demo", "customer"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(args.validate().is_ok());

        let args =
            Args::try_parse_from(["pcb-release-action", "sync-workflows", "--limit", "0"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn workspace_root_must_be_a_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();

        let mut args = Args::try_parse_from(["pcb-release-action", "batch"]).unwrap();
        args.workspace = Some(dir.path().to_path_buf());
        assert_eq!(args.workspace_root().unwrap(), dir.path());

        args.workspace = Some(file);
        assert!(args.workspace_root().is_err());
    }
}
