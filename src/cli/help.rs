//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Stable command name used in log events (e.g. "update", "verify").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Update { .. } => "update",
        Commands::Import { .. } => "import",
        Commands::Verify { .. } => "verify",
        Commands::Status => "status",
        Commands::Export => "export",
    }
}

/// Commands that write the sidecar when not pretending.
pub fn command_mutates(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Init { .. } | Commands::Update { .. } | Commands::Import { .. }
    )
}
