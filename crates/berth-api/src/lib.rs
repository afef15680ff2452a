//! # berth-api
//!
//! Builds the task and container state-change events an agent submits to
//! the control plane.
//!
//! The constructors in [`statechange`] decide whether a transition may be
//! reported and take an immutable snapshot of it. Each status value is
//! turned into an event at most once: the constructors refuse when the
//! entity's sent status has already reached its known status, and the
//! caller records delivery through [`state::AgentState`] using the key
//! carried by the snapshot.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod attachment;
pub mod container;
pub mod error;
pub mod event;
pub mod state;
pub mod statechange;
pub mod status;
pub mod task;

pub use container::{Container, PortBinding, TransportProtocol};
pub use error::StateChangeError;
pub use event::{Event, EventType, StateChangeEvent};
pub use statechange::{ContainerStateChange, TaskStateChange};
pub use status::{ContainerStatus, TaskStatus};
pub use task::Task;
