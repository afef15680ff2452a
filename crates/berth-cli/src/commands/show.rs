//! `berth show`: List tracked tasks with known and sent statuses.

use anyhow::Context;
use berth_api::state::AgentState;
use berth_common::config::BerthConfig;
use clap::Args;

use crate::output;

/// Arguments for the `show` command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Show all tasks (including stopped).
    #[arg(short, long)]
    pub all: bool,
}

/// Executes the `show` command.
///
/// # Errors
///
/// Returns an error if the state file cannot be loaded.
pub fn execute(args: &ShowArgs, config: &BerthConfig) -> anyhow::Result<()> {
    let path = &config.state_file;
    let state = AgentState::load(path)
        .with_context(|| format!("loading agent state from {}", path.display()))?;

    let tasks: Vec<_> = state
        .tasks()
        .filter(|t| args.all || !t.known_status().terminal())
        .collect();

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!(
        "{:<48} {:<10} {:<10} {:<20} CONTAINERS",
        "TASK ARN", "KNOWN", "SENT", "PULL STARTED"
    );
    for task in tasks {
        println!(
            "{:<48} {:<10} {:<10} {:<20} {}",
            task.arn(),
            task.known_status(),
            task.sent_status(),
            output::format_timestamp(task.pull_started_at()),
            output::container_summary(task)
        );
    }

    Ok(())
}
