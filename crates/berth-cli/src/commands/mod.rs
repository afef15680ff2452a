//! CLI command definitions and dispatch.

pub mod events;
pub mod show;

use std::path::PathBuf;

use berth_common::config::BerthConfig;
use clap::{Parser, Subcommand};

/// Berth: inspect and acknowledge task state-change events.
#[derive(Parser, Debug)]
#[command(name = berth_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "BERTH_CONFIG", default_value = berth_common::constants::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the agent state file (overrides the configuration).
    #[arg(long, global = true, env = "BERTH_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the task and container events that are pending delivery.
    Events(events::EventsArgs),
    /// List tracked tasks with their known and sent statuses.
    Show(show::ShowArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli, config: &BerthConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Events(args) => events::execute(&args, config),
        Command::Show(args) => show::execute(&args, config),
    }
}
