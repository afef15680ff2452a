//! Container entity as tracked by the agent.
//!
//! A [`Container`] is owned by its [`Task`](crate::task::Task). Mutable
//! fields sit behind a lock so that every accessor is an atomic
//! point-in-time read.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::status::ContainerStatus;

/// Transport protocol of a published port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// A host port picked for one of the container's ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    /// Port inside the container.
    pub container_port: u16,
    /// Port on the host.
    pub host_port: u16,
    /// Host address the port is bound to.
    pub bind_ip: String,
    /// Transport protocol.
    #[serde(default)]
    pub protocol: TransportProtocol,
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} {} {} {}}}",
            self.container_port, self.host_port, self.bind_ip, self.protocol
        )
    }
}

/// The error recorded by the last operation the agent failed to apply
/// to a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyingError {
    /// Short error class, e.g. `CannotPullContainerError`.
    pub name: String,
    /// Human-readable detail.
    pub message: String,
}

impl ApplyingError {
    /// Creates an applying error.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApplyingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Serializable form of a container, as kept in the agent state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Container name, unique within its task.
    pub name: String,
    /// Most recently observed status.
    #[serde(default)]
    pub known_status: ContainerStatus,
    /// Highest status already reported.
    #[serde(default)]
    pub sent_status: ContainerStatus,
    /// Status regarded as the container's running condition.
    #[serde(default = "default_steady_state")]
    pub steady_state_status: ContainerStatus,
    /// Error from the most recent failed operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applying_error: Option<ApplyingError>,
    /// Published port bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_bindings: Vec<PortBinding>,
    /// Exit code, once the container has exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Agent-internal container, never reported.
    #[serde(default)]
    pub internal: bool,
}

const fn default_steady_state() -> ContainerStatus {
    ContainerStatus::Running
}

#[derive(Debug, Default)]
struct ContainerState {
    known_status: ContainerStatus,
    sent_status: ContainerStatus,
    applying_error: Option<ApplyingError>,
    port_bindings: Vec<PortBinding>,
    exit_code: Option<i32>,
}

/// A container belonging to a task.
#[derive(Debug)]
pub struct Container {
    name: String,
    steady_state_status: ContainerStatus,
    internal: bool,
    state: RwLock<ContainerState>,
}

impl Container {
    /// Creates a container with no status, steady state `Running`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steady_state_status: default_steady_state(),
            internal: false,
            state: RwLock::new(ContainerState::default()),
        }
    }

    /// Sets the status regarded as this container's running condition.
    #[must_use]
    pub fn with_steady_state(mut self, status: ContainerStatus) -> Self {
        self.steady_state_status = status;
        self
    }

    /// Marks the container as agent-internal.
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Rebuilds a container from its persisted record.
    #[must_use]
    pub fn from_record(record: ContainerRecord) -> Self {
        Self {
            name: record.name,
            steady_state_status: record.steady_state_status,
            internal: record.internal,
            state: RwLock::new(ContainerState {
                known_status: record.known_status,
                sent_status: record.sent_status,
                applying_error: record.applying_error,
                port_bindings: record.port_bindings,
                exit_code: record.exit_code,
            }),
        }
    }

    /// Captures the container's current state as a record.
    #[must_use]
    pub fn to_record(&self) -> ContainerRecord {
        let state = self.read();
        ContainerRecord {
            name: self.name.clone(),
            known_status: state.known_status,
            sent_status: state.sent_status,
            steady_state_status: self.steady_state_status,
            applying_error: state.applying_error.clone(),
            port_bindings: state.port_bindings.clone(),
            exit_code: state.exit_code,
            internal: self.internal,
        }
    }

    /// Container name, unique within its task.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status regarded as this container's running condition.
    #[must_use]
    pub const fn steady_state_status(&self) -> ContainerStatus {
        self.steady_state_status
    }

    /// Whether the container exists only for the agent's own purposes.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.internal
    }

    /// Most recently observed status.
    #[must_use]
    pub fn known_status(&self) -> ContainerStatus {
        self.read().known_status
    }

    /// Records a newly observed status.
    pub fn set_known_status(&self, status: ContainerStatus) {
        self.write().known_status = status;
    }

    /// Highest status already reported to the control plane.
    #[must_use]
    pub fn sent_status(&self) -> ContainerStatus {
        self.read().sent_status
    }

    /// Records that `status` has been reported.
    pub fn set_sent_status(&self, status: ContainerStatus) {
        self.write().sent_status = status;
    }

    /// Error from the most recent failed operation, if any.
    #[must_use]
    pub fn applying_error(&self) -> Option<ApplyingError> {
        self.read().applying_error.clone()
    }

    /// Records the error of a failed operation.
    pub fn set_applying_error(&self, error: ApplyingError) {
        self.write().applying_error = Some(error);
    }

    /// Published port bindings.
    #[must_use]
    pub fn known_port_bindings(&self) -> Vec<PortBinding> {
        self.read().port_bindings.clone()
    }

    /// Replaces the published port bindings.
    pub fn set_known_port_bindings(&self, bindings: Vec<PortBinding>) {
        self.write().port_bindings = bindings;
    }

    /// Exit code, once the container has exited.
    #[must_use]
    pub fn known_exit_code(&self) -> Option<i32> {
        self.read().exit_code
    }

    /// Records the container's exit code.
    pub fn set_known_exit_code(&self, code: i32) {
        self.write().exit_code = Some(code);
    }

    fn read(&self) -> RwLockReadGuard<'_, ContainerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContainerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
