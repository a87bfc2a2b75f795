//! Error types for pcb release operations.
//!
//! Per-target errors (resolution, tool failures, missing artifacts) are
//! separated from run-level errors (configuration, missing tooling) so batch
//! mode can decide whether to continue or abort.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pcb release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Missing or empty required input
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// External tool errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Target resolution errors
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Tool payload errors
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Artifact collection errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Workflow sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required input missing
    #[error("Missing required input: {input}")]
    MissingInput {
        /// Input name (flag or environment variable)
        input: String,
    },

    /// Input present but contained no usable entries
    #[error("Input '{input}' is empty")]
    EmptyInput {
        /// Input name (flag or environment variable)
        input: String,
    },

    /// Single-target input named more than one path
    #[error("Input '{input}' must name exactly one path, got {count}")]
    TooManyPaths {
        /// Input name (flag or environment variable)
        input: String,
        /// Number of paths given
        count: usize,
    },

    /// Workspace root unusable
    #[error("Workspace root is not a directory: {path}")]
    InvalidWorkspace {
        /// Path given as workspace root
        path: PathBuf,
    },
}

/// External `pcb` tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Binary not found after all lookups (and install attempt, if configured)
    #[error("'{tool}' not found (searched: {searched})")]
    Missing {
        /// Tool name
        tool: String,
        /// Human-readable list of locations searched
        searched: String,
    },

    /// Install command failed
    #[error("Install command '{command}' failed: {reason}")]
    InstallFailed {
        /// Install command line
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Process could not be started
    #[error("Failed to run {command}: {reason}")]
    Spawn {
        /// Command line
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Process ran and exited non-zero
    #[error("{command} exited with {status}{}", format_stderr(.stderr))]
    ExternalTool {
        /// Command line
        command: String,
        /// Exit status description
        status: String,
        /// Trailing stderr output
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr.trim_end())
    }
}

/// Target resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Neither a directory nor a file at the given path
    #[error("No such file or directory: {input} (looked at {path})")]
    NotFound {
        /// Raw input
        input: String,
        /// Resolved location checked
        path: PathBuf,
    },

    /// Directory with zero or more than one candidate file
    #[error("{}", describe_ambiguous(.dir, .candidates))]
    Ambiguous {
        /// Directory searched
        dir: PathBuf,
        /// Candidate files found
        candidates: Vec<PathBuf>,
    },
}

fn describe_ambiguous(dir: &std::path::Path, candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        format!("No .zen file found in directory {}", dir.display())
    } else {
        let names: Vec<String> = candidates
            .iter()
            .map(|c| {
                c.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| c.display().to_string())
            })
            .collect();
        format!(
            "Multiple .zen files found in directory {}: {}",
            dir.display(),
            names.join(", ")
        )
    }
}

/// Tool payload errors
#[derive(Error, Debug)]
pub enum PayloadError {
    /// No JSON object in the tool's output
    #[error("No JSON object found in tool output ({lines} lines)")]
    NotFound {
        /// Number of stdout lines examined
        lines: usize,
    },

    /// JSON found but malformed
    #[error("Malformed JSON payload: {source}")]
    Malformed {
        /// Parse error
        #[source]
        source: serde_json::Error,
    },
}

/// Artifact collection errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Declared archive absent
    #[error("Release archive not found: {}", display_archive(.archive))]
    Missing {
        /// Declared archive path (may be empty)
        archive: PathBuf,
    },

    /// Copy into the output directory failed
    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        /// Source archive
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// IO error
        #[source]
        source: std::io::Error,
    },
}

fn display_archive(archive: &std::path::Path) -> String {
    if archive.as_os_str().is_empty() {
        "<empty archive path>".to_string()
    } else {
        archive.display().to_string()
    }
}

/// Workflow sync errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// Canonical workflow file absent
    #[error("Source workflow file not found: {path}")]
    SourceWorkflowMissing {
        /// Expected path
        path: PathBuf,
    },

    /// A git or gh invocation failed
    #[error("{command} failed: {reason}")]
    CommandFailed {
        /// Command line
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Whether this error belongs to a single target.
    ///
    /// Batch mode records per-target errors and moves on; anything else
    /// aborts the run.
    pub fn is_per_target(&self) -> bool {
        matches!(
            self,
            ReleaseError::Resolve(_)
                | ReleaseError::Payload(_)
                | ReleaseError::Artifact(_)
                | ReleaseError::Tool(ToolError::ExternalTool { .. })
        )
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::MissingInput { input })
            | ReleaseError::Config(ConfigError::EmptyInput { input }) => vec![
                format!("Provide a value for {input}"),
                "Separate multiple paths with commas or newlines".to_string(),
            ],
            ReleaseError::Config(ConfigError::TooManyPaths { .. }) => vec![
                "Use the batch command to release several targets".to_string(),
            ],
            ReleaseError::Tool(ToolError::Missing { .. }) => vec![
                "Install pcb and make sure it is on PATH".to_string(),
                "Point PCB_BIN at the pcb executable".to_string(),
                "Set PCB_INSTALL_COMMAND to let this action install pcb".to_string(),
            ],
            ReleaseError::Resolve(ResolveError::Ambiguous { .. }) => vec![
                "Pass the .zen file itself instead of its directory".to_string(),
            ],
            ReleaseError::Sync(SyncError::SourceWorkflowMissing { .. }) => vec![
                "Run from the repository that holds .github/workflows/pcb-release.yml".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_target_errors_are_recoverable_in_batch() {
        let err = ReleaseError::from(ResolveError::NotFound {
            input: "boards/x".to_string(),
            path: PathBuf::from("/ws/boards/x"),
        });
        assert!(err.is_per_target());

        let err = ReleaseError::from(ArtifactError::Missing {
            archive: PathBuf::new(),
        });
        assert!(err.is_per_target());
        assert!(err.to_string().contains("<empty archive path>"));

        let err = ReleaseError::from(ToolError::Missing {
            tool: "pcb".to_string(),
            searched: "PATH".to_string(),
        });
        assert!(!err.is_per_target());

        let err = ReleaseError::from(ConfigError::EmptyInput {
            input: "INPUT_PATHS".to_string(),
        });
        assert!(!err.is_per_target());
    }

    #[test]
    fn ambiguous_message_lists_candidates() {
        let err = ResolveError::Ambiguous {
            dir: PathBuf::from("/ws/boards"),
            candidates: vec![PathBuf::from("/ws/boards/a.zen"), PathBuf::from("/ws/boards/b.zen")],
        };
        let msg = err.to_string();
        assert!(msg.contains("Multiple"));
        assert!(msg.contains("a.zen, b.zen"));

        let err = ResolveError::Ambiguous {
            dir: PathBuf::from("/ws/empty"),
            candidates: vec![],
        };
        assert!(err.to_string().starts_with("No .zen file found"));
    }

    #[test]
    fn external_tool_error_includes_stderr() {
        let err = ToolError::ExternalTool {
            command: "pcb release a.zen -f json".to_string(),
            status: "exit status: 2".to_string(),
            stderr: "error: bad board\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pcb release a.zen -f json exited with exit status: 2:\nerror: bad board"
        );
    }
}
