//! `berth events`: Print pending task and container events and optionally
//! acknowledge them.

use anyhow::Context;
use berth_api::state::AgentState;
use berth_api::Event;
use berth_common::config::BerthConfig;
use clap::Args;
use serde::Serialize;

/// Arguments for the `events` command.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Reason attached to every event (defaults to the configured reason).
    #[arg(long)]
    pub reason: Option<String>,

    /// Print events as a JSON document instead of log lines.
    #[arg(long)]
    pub json: bool,

    /// Record the printed events as delivered and save the state file.
    #[arg(long)]
    pub mark_sent: bool,
}

#[derive(Serialize)]
struct Envelope<'a> {
    cluster: &'a str,
    events: &'a [Event],
}

/// Executes the `events` command.
///
/// # Errors
///
/// Returns an error if the state file cannot be loaded or saved.
pub fn execute(args: &EventsArgs, config: &BerthConfig) -> anyhow::Result<()> {
    let path = &config.state_file;
    let state = AgentState::load(path)
        .with_context(|| format!("loading agent state from {}", path.display()))?;

    let reason = args.reason.as_deref().unwrap_or(&config.default_reason);
    let events = state.pending_events(reason);
    tracing::info!(cluster = %config.cluster, count = events.len(), "pending events collected");

    if args.json {
        println!("{}", render_json(&config.cluster, &events)?);
    } else if events.is_empty() {
        println!("No pending events.");
    } else {
        for event in &events {
            println!("{event}");
        }
    }

    if args.mark_sent && !events.is_empty() {
        for event in &events {
            state.mark_sent(event)?;
        }
        state
            .save(path)
            .with_context(|| format!("saving agent state to {}", path.display()))?;
        tracing::info!(count = events.len(), "events marked sent");
    }

    Ok(())
}

fn render_json(cluster: &str, events: &[Event]) -> anyhow::Result<String> {
    let envelope = Envelope { cluster, events };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

#[cfg(test)]
mod tests {
    use berth_api::{
        Container, ContainerStateChange, ContainerStatus, Task, TaskStateChange, TaskStatus,
    };

    use super::*;

    #[test]
    fn json_envelope_tags_each_event() {
        let sidecar = Container::new("sidecar");
        sidecar.set_known_status(ContainerStatus::Stopped);
        let task = Task::new("t1", vec![sidecar]);
        task.set_known_status(TaskStatus::Stopped);
        let sidecar = task.container("sidecar").expect("container");
        let change = TaskStateChange::new(&task, "done").expect("event");
        let container = ContainerStateChange::new(&task, sidecar, "").expect("event");

        let rendered =
            render_json("prod", &[Event::from(change), Event::from(container)]).expect("json");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("parse");
        assert_eq!(value["cluster"], "prod");
        assert_eq!(value["events"][0]["type"], "task");
        assert_eq!(value["events"][0]["event"]["reason"], "done");
        assert_eq!(value["events"][1]["type"], "container");
        assert_eq!(value["events"][1]["event"]["containerName"], "sidecar");
    }
}
