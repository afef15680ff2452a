//! Event-type tagging for downstream dispatch.
//!
//! A dispatcher routes snapshots to per-type delivery queues by asking
//! for their [`EventType`] instead of inspecting their structure.

use std::fmt;

use serde::Serialize;

use crate::statechange::{ContainerStateChange, TaskStateChange};

/// Kind of a state-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A container changed status.
    Container,
    /// A task changed status.
    Task,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => f.write_str("container"),
            Self::Task => f.write_str("task"),
        }
    }
}

/// Implemented by every state-change snapshot.
pub trait StateChangeEvent {
    /// Identifies the kind of event.
    fn event_type(&self) -> EventType;
}

impl StateChangeEvent for ContainerStateChange {
    fn event_type(&self) -> EventType {
        EventType::Container
    }
}

impl StateChangeEvent for TaskStateChange {
    fn event_type(&self) -> EventType {
        EventType::Task
    }
}

/// Either kind of snapshot, for queues that carry both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "event", rename_all = "lowercase")]
pub enum Event {
    /// A container event.
    Container(ContainerStateChange),
    /// A task event.
    Task(TaskStateChange),
}

impl StateChangeEvent for Event {
    fn event_type(&self) -> EventType {
        match self {
            Self::Container(change) => change.event_type(),
            Self::Task(change) => change.event_type(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(change) => fmt::Display::fmt(change, f),
            Self::Task(change) => fmt::Display::fmt(change, f),
        }
    }
}

impl From<ContainerStateChange> for Event {
    fn from(change: ContainerStateChange) -> Self {
        Self::Container(change)
    }
}

impl From<TaskStateChange> for Event {
    fn from(change: TaskStateChange) -> Self {
        Self::Task(change)
    }
}
