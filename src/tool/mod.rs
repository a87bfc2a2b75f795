//! The external `pcb` tool: locating (and optionally installing) it, and
//! running `pcb release` against a target.

mod payload;

pub use payload::{JSON_TAIL_LINES, ReleasePayload};

use crate::error::ToolError;
use crate::source::Target;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Name of the external release tool
pub const PCB_TOOL: &str = "pcb";

/// Stderr lines kept for error messages
const STDERR_TAIL_LINES: usize = 20;

/// Default install location used by the pcb installer (relative to home)
fn default_install_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pcb").join("bin").join(PCB_TOOL))
}

/// Handle to a located `pcb` binary
#[derive(Debug, Clone)]
pub struct PcbTool {
    bin: PathBuf,
}

impl PcbTool {
    /// Use a specific binary without any lookup
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Path to the binary
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Find `pcb`, running `install_command` once if it is not found.
    ///
    /// Lookup order: `explicit` (path or name), `PATH`, `~/.pcb/bin/pcb`.
    pub async fn locate(
        explicit: Option<&Path>,
        install_command: Option<&str>,
    ) -> Result<Self, ToolError> {
        if let Some(tool) = Self::lookup(explicit) {
            return Ok(tool);
        }

        // Action inputs arrive as empty strings when unset.
        let install_command = install_command.map(str::trim).filter(|c| !c.is_empty());
        if let Some(command) = install_command {
            log::info!("{PCB_TOOL} not found, running install command: {command}");
            run_install(command).await?;
            if let Some(tool) = Self::lookup(explicit) {
                return Ok(tool);
            }
        }

        let mut searched = Vec::new();
        if let Some(explicit) = explicit {
            searched.push(explicit.display().to_string());
        }
        searched.push("PATH".to_string());
        if let Some(default) = default_install_path() {
            searched.push(default.display().to_string());
        }

        Err(ToolError::Missing {
            tool: PCB_TOOL.to_string(),
            searched: searched.join(", "),
        })
    }

    fn lookup(explicit: Option<&Path>) -> Option<Self> {
        if let Some(explicit) = explicit {
            // An explicit binary that cannot be found is not silently replaced.
            return which::which(explicit).ok().map(Self::new);
        }

        if let Ok(bin) = which::which(PCB_TOOL) {
            return Some(Self::new(bin));
        }

        default_install_path()
            .filter(|path| path.is_file())
            .map(Self::new)
    }

    /// Report the tool version (`pcb --version`), for logs.
    pub async fn version(&self) -> Option<String> {
        let output = Command::new(&self.bin).arg("--version").output().await.ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run `pcb release <target> -f json` from `workspace`.
    ///
    /// Stderr is streamed through as it arrives; stdout is captured and
    /// parsed. An unreadable payload yields empty fields.
    pub async fn release(
        &self,
        target: &Target,
        workspace: &Path,
    ) -> Result<ReleasePayload, ToolError> {
        let command_line = format!(
            "{} release {} -f json",
            self.bin.display(),
            target.path.display()
        );
        log::debug!("Running: {command_line}");

        let mut child = Command::new(&self.bin)
            .arg("release")
            .arg(&target.path)
            .args(["-f", "json"])
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::Spawn {
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        let stderr_handle = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

                while let Ok(Some(line)) = lines.next_line().await {
                    eprintln!("{line}");
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }

                tail.into_iter().collect::<Vec<_>>().join("\n")
            })
        });

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout)
                .await
                .map_err(|e| ToolError::Spawn {
                    command: command_line.clone(),
                    reason: format!("failed to read stdout: {e}"),
                })?;
        }

        let status = child.wait().await.map_err(|e| ToolError::Spawn {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        let stderr_tail = match stderr_handle {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(ToolError::ExternalTool {
                command: command_line,
                status: status.to_string(),
                stderr: stderr_tail,
            });
        }

        Ok(ReleasePayload::extract_lenient(&stdout))
    }
}

async fn run_install(command: &str) -> Result<(), ToolError> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| ToolError::InstallFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    if !status.success() {
        return Err(ToolError::InstallFailed {
            command: command.to_string(),
            reason: status.to_string(),
        });
    }

    Ok(())
}
