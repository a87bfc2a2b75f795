//! Command line interface for pcb-release-action.
//!
//! Parses arguments (flags with environment fallbacks), dispatches to the
//! release, batch and sync-workflows commands, and maps results to exit codes.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig, ToolArgs};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
