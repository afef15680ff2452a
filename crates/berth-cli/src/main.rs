//! # berth: state-change event inspector
//!
//! Loads the agent state file, shows which task and container events are
//! pending, and can record them as delivered.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod output;

use anyhow::Context;
use berth_common::config::BerthConfig;
use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BerthConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(state_file) = &cli.state_file {
        config.state_file.clone_from(state_file);
    }
    config.json_logs |= cli.json_logs;

    init_tracing(config.json_logs);
    commands::execute(cli, &config)
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
