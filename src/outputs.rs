//! Step outputs for GitHub Actions.
//!
//! Outputs are appended to the file named by `GITHUB_OUTPUT`. Outside of
//! Actions they are printed to stdout as `name=value` lines.

use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;

/// Environment variable naming the outputs file
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

const DELIMITER_BASE: &str = "PCB_RELEASE_EOF";

#[derive(Debug, Clone)]
enum Sink {
    File(PathBuf),
    Stdout,
}

/// Writer for step outputs
#[derive(Debug, Clone)]
pub struct ActionOutputs {
    sink: Sink,
}

impl ActionOutputs {
    /// Use `GITHUB_OUTPUT` if set, stdout otherwise
    pub fn from_env() -> Self {
        match std::env::var_os(GITHUB_OUTPUT_ENV) {
            Some(path) if !path.is_empty() => Self::to_file(path),
            _ => Self::stdout(),
        }
    }

    /// Append outputs to a file
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: Sink::File(path.into()),
        }
    }

    /// Print outputs to stdout
    pub fn stdout() -> Self {
        Self { sink: Sink::Stdout }
    }

    /// Set one output
    pub fn set(&self, name: &str, value: &str) -> anyhow::Result<()> {
        let record = format_output(name, value);
        match &self.sink {
            Sink::File(path) => std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(record.as_bytes()))
                .with_context(|| {
                    format!("Failed to write output '{name}' to {}", path.display())
                }),
            Sink::Stdout => std::io::stdout()
                .lock()
                .write_all(record.as_bytes())
                .with_context(|| format!("Failed to write output '{name}' to stdout")),
        }
    }
}

/// Format a single output record.
///
/// Multi-line values use the heredoc form with a delimiter that does not
/// occur in the value.
pub fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{name}={value}\n");
    }

    let mut delimiter = DELIMITER_BASE.to_string();
    let mut n = 0;
    while value.contains(&delimiter) {
        n += 1;
        delimiter = format!("{DELIMITER_BASE}_{n}");
    }

    let value = value.strip_suffix('\n').unwrap_or(value);
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}
