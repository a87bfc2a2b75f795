//! Command execution.
//!
//! Each command returns an exit code; errors that escape a command are
//! printed with recovery suggestions and mapped to exit code 1.

mod batch;
mod helpers;
mod release;
mod sync;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use batch::execute_batch;
use release::execute_release;
use sync::execute_sync;

/// Execute the command selected by `args`
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        let output = super::OutputManager::new(false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from_args(&args);

    let result = match &args.command {
        Command::Release { .. } => execute_release(&args, &config).await,
        Command::Batch { .. } => execute_batch(&args, &config).await,
        Command::SyncWorkflows { .. } => execute_sync(&args, &config).await,
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                config.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    config.println(&format!("  • {}", suggestion));
                }
            }

            Ok(1)
        }
    }
}
