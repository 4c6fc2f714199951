//! GIMS - automation component client
//!
//! Usage:
//!   gims script list                       # CRUD per object kind
//!   gims ds-type get 42
//!   gims checkout --component-type script --name "ICMP Monitor"
//!   gims publish --input-dir ./icmp_monitor --confirm
//!   gims logs stream 42 --timeout 60

mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gims_core::api::HttpGateway;

use crate::commands::activator_types::ActivatorTypeCommand;
use crate::commands::datasource_types::DsTypeCommand;
use crate::commands::logs::LogsCommand;
use crate::commands::references::RefCommand;
use crate::commands::scripts::ScriptCommand;
use crate::commands::sync::SyncCommand;
use crate::output::{failure, print_error};

#[derive(Parser)]
#[command(name = "gims")]
#[command(about = "GIMS automation components: CRUD, local-first sync and log tailing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scripts and script folders
    #[command(subcommand)]
    Script(ScriptCommand),

    /// DataSource types, their properties, methods and parameters
    #[command(subcommand)]
    DsType(DsTypeCommand),

    /// Activator types and their properties
    #[command(subcommand)]
    ActivatorType(ActivatorTypeCommand),

    /// Reference data (value types, property sections)
    #[command(subcommand)]
    Ref(RefCommand),

    /// Script execution logs
    #[command(subcommand)]
    Logs(LogsCommand),

    #[command(flatten)]
    Sync(SyncCommand),
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Script(command) => with_gateway(|gw| {
            commands::scripts::run(gw, command)?;
            Ok(ExitCode::SUCCESS)
        }),
        Commands::DsType(command) => with_gateway(|gw| {
            commands::datasource_types::run(gw, command)?;
            Ok(ExitCode::SUCCESS)
        }),
        Commands::ActivatorType(command) => with_gateway(|gw| {
            commands::activator_types::run(gw, command)?;
            Ok(ExitCode::SUCCESS)
        }),
        Commands::Ref(command) => with_gateway(|gw| {
            commands::references::run(gw, command)?;
            Ok(ExitCode::SUCCESS)
        }),
        Commands::Logs(command) => with_gateway(|gw| commands::logs::run(gw, command)),
        Commands::Sync(command) => commands::sync::run(command),
    }
}

/// Run a CRUD or logs command; failures print `Error:`/`Detail:` to stderr.
fn with_gateway(run: impl FnOnce(&HttpGateway) -> Result<ExitCode>) -> ExitCode {
    let outcome = HttpGateway::from_env()
        .map_err(anyhow::Error::from)
        .and_then(|gateway| run(&gateway));
    match outcome {
        Ok(code) => code,
        Err(err) => {
            print_error(&err);
            failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_commands_sit_at_top_level() {
        let cli = Cli::try_parse_from(["gims", "status", "--base-dir", "./scripts"]).unwrap();
        assert!(matches!(cli.command, Commands::Sync(SyncCommand::Status { .. })));
    }

    #[test]
    fn crud_groups_use_short_names() {
        let cli = Cli::try_parse_from(["gims", "ds-type", "list-methods", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::DsType(DsTypeCommand::ListMethods { type_id: 7 })
        ));
    }

    #[test]
    fn param_direction_flags_conflict() {
        let result = Cli::try_parse_from([
            "gims",
            "ds-type",
            "create-param",
            "--method-id",
            "1",
            "--label",
            "host",
            "--value-type-id",
            "2",
            "--input",
            "--output",
        ]);
        assert!(result.is_err());
    }
}
