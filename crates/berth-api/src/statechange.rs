//! Task and container state-change snapshots.
//!
//! A snapshot is taken when the agent observes a status transition and is
//! handed to the delivery layer. Constructors refuse to build a snapshot
//! for a status the control plane does not accept, for an agent-internal
//! container, or for a status that has already been sent. Snapshots copy
//! every value out of their source entity and carry only its key, which
//! the caller passes to [`AgentState`](crate::state::AgentState) once the
//! event has been delivered.

use std::fmt;

use berth_common::types::{ContainerKey, TaskArn};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::attachment::EniAttachment;
use crate::container::{Container, PortBinding};
use crate::error::StateChangeError;
use crate::status::{ContainerStatus, TaskStatus};
use crate::task::Task;

/// A container status change to submit to the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStateChange {
    task_arn: TaskArn,
    container_name: String,
    status: ContainerStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(rename = "networkBindings", skip_serializing_if = "Vec::is_empty")]
    port_bindings: Vec<PortBinding>,
    #[serde(skip)]
    agent_status: ContainerStatus,
    #[serde(skip)]
    known_sent_status: ContainerStatus,
}

impl ContainerStateChange {
    /// Builds the event for the container's current known status.
    ///
    /// An empty `reason` is replaced by the container's last applying
    /// error, when it has one.
    ///
    /// # Errors
    ///
    /// - [`StateChangeError::InternalContainer`] for agent-internal
    ///   containers, whatever their status.
    /// - [`StateChangeError::UnrecognizedStatus`] when the known status is
    ///   neither the container's steady state nor `Stopped`.
    /// - [`StateChangeError::AlreadySent`] when the sent status has
    ///   already reached the known status.
    pub fn new(
        task: &Task,
        container: &Container,
        reason: impl Into<String>,
    ) -> Result<Self, StateChangeError> {
        if container.is_internal() {
            return Err(StateChangeError::InternalContainer {
                task_arn: task.arn().clone(),
                container: container.name().to_owned(),
            });
        }

        let known = container.known_status();
        let steady_state = container.steady_state_status();
        if !known.should_report_to_backend(steady_state) {
            return Err(StateChangeError::UnrecognizedStatus {
                task_arn: task.arn().clone(),
                container: Some(container.name().to_owned()),
                status: known.to_string(),
            });
        }

        let sent = container.sent_status();
        if sent >= known {
            return Err(StateChangeError::AlreadySent {
                task_arn: task.arn().clone(),
                container: Some(container.name().to_owned()),
                status: known.to_string(),
            });
        }

        let mut reason = reason.into();
        if reason.is_empty() {
            if let Some(error) = container.applying_error() {
                reason = error.to_string();
            }
        }

        let change = Self {
            task_arn: task.arn().clone(),
            container_name: container.name().to_owned(),
            status: known.backend_status(steady_state),
            reason,
            exit_code: container.known_exit_code(),
            port_bindings: container.known_port_bindings(),
            agent_status: known,
            known_sent_status: sent,
        };
        tracing::debug!(
            task_arn = %change.task_arn,
            container = %change.container_name,
            status = %change.status,
            "container state change created"
        );
        Ok(change)
    }

    /// Key of the container this event was built from.
    #[must_use]
    pub fn key(&self) -> ContainerKey {
        ContainerKey::new(self.task_arn.clone(), self.container_name.as_str())
    }

    /// ARN of the owning task.
    #[must_use]
    pub const fn task_arn(&self) -> &TaskArn {
        &self.task_arn
    }

    /// Container name.
    #[must_use]
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Status as the control plane sees it.
    #[must_use]
    pub const fn status(&self) -> ContainerStatus {
        self.status
    }

    /// The agent's own status for the container when the event was built.
    ///
    /// This is what the container's sent status becomes once the event
    /// is delivered.
    #[must_use]
    pub const fn agent_status(&self) -> ContainerStatus {
        self.agent_status
    }

    /// Why the container changed status; may be empty.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Exit code, if the container had exited.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Host ports bound for the container.
    #[must_use]
    pub fn port_bindings(&self) -> &[PortBinding] {
        &self.port_bindings
    }

    /// Sent status of the container when the event was built.
    #[must_use]
    pub const fn known_sent_status(&self) -> ContainerStatus {
        self.known_sent_status
    }
}

impl fmt::Display for ContainerStateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.task_arn, self.container_name, self.status)?;
        if let Some(code) = self.exit_code {
            write!(f, ", Exit {code}")?;
        }
        if !self.reason.is_empty() {
            write!(f, ", Reason {}", self.reason)?;
        }
        if !self.port_bindings.is_empty() {
            f.write_str(", Ports [")?;
            for (i, binding) in self.port_bindings.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{binding}")?;
            }
            f.write_str("]")?;
        }
        write!(f, ", Known Sent: {}", self.known_sent_status)
    }
}

/// A task status change to submit to the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<EniAttachment>,
    task_arn: TaskArn,
    #[serde(serialize_with = "serialize_task_status")]
    status: TaskStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    containers: Vec<ContainerStateChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_stopped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_stopped_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    known_sent_status: TaskStatus,
}

fn serialize_task_status<S: Serializer>(status: &TaskStatus, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(status.backend_status())
}

impl TaskStateChange {
    /// Builds the event for the task's current known status.
    ///
    /// The task's timestamps are copied in UTC; unset ones are left out.
    ///
    /// # Errors
    ///
    /// - [`StateChangeError::UnrecognizedStatus`] when the known status is
    ///   not accepted by the control plane.
    /// - [`StateChangeError::AlreadySent`] when the sent status has
    ///   already reached the known status.
    pub fn new(task: &Task, reason: impl Into<String>) -> Result<Self, StateChangeError> {
        let known = task.known_status();
        if !known.backend_recognized() {
            return Err(StateChangeError::UnrecognizedStatus {
                task_arn: task.arn().clone(),
                container: None,
                status: known.to_string(),
            });
        }

        let sent = task.sent_status();
        if sent >= known {
            return Err(StateChangeError::AlreadySent {
                task_arn: task.arn().clone(),
                container: None,
                status: known.to_string(),
            });
        }

        let change = Self {
            attachment: None,
            task_arn: task.arn().clone(),
            status: known,
            reason: reason.into(),
            containers: Vec::new(),
            pull_started_at: None,
            pull_stopped_at: None,
            execution_stopped_at: None,
            known_sent_status: sent,
        }
        .with_task_timestamps(task);
        tracing::debug!(task_arn = %change.task_arn, status = %change.status, "task state change created");
        Ok(change)
    }

    fn with_task_timestamps(mut self, task: &Task) -> Self {
        self.pull_started_at = task.pull_started_at().map(|t| t.with_timezone(&Utc));
        self.pull_stopped_at = task.pull_stopped_at().map(|t| t.with_timezone(&Utc));
        self.execution_stopped_at = task.execution_stopped_at().map(|t| t.with_timezone(&Utc));
        self
    }

    /// Builds the events of every container in `task` that has something
    /// to report, in container order.
    ///
    /// Containers whose constructor declines are skipped.
    #[must_use]
    pub fn container_changes(task: &Task, reason: &str) -> Vec<ContainerStateChange> {
        task.containers()
            .iter()
            .filter_map(|container| match ContainerStateChange::new(task, container, reason) {
                Ok(change) => Some(change),
                Err(e) if e.is_expected() => {
                    tracing::trace!(container = container.name(), reason = %e, "container event skipped");
                    None
                }
                Err(e) => {
                    tracing::debug!(container = container.name(), reason = %e, "container event skipped");
                    None
                }
            })
            .collect()
    }

    /// Attaches container events to this task event.
    #[must_use]
    pub fn with_container_changes(mut self, changes: Vec<ContainerStateChange>) -> Self {
        self.containers.extend(changes);
        self
    }

    /// Attaches a network interface attachment to this task event.
    #[must_use]
    pub fn with_attachment(mut self, attachment: EniAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Whether this event is worth sending.
    ///
    /// Running and stopped transitions are always reported; any other
    /// status only when it carries container events.
    #[must_use]
    pub fn should_be_reported(&self) -> bool {
        matches!(self.status, TaskStatus::Running | TaskStatus::Stopped)
            || !self.containers.is_empty()
    }

    /// Key of the task this event was built from.
    #[must_use]
    pub const fn key(&self) -> &TaskArn {
        &self.task_arn
    }

    /// Task ARN.
    #[must_use]
    pub const fn task_arn(&self) -> &TaskArn {
        &self.task_arn
    }

    /// Status being reported.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Why the task changed status; may be empty.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Container events carried by this task event.
    #[must_use]
    pub fn containers(&self) -> &[ContainerStateChange] {
        &self.containers
    }

    /// Network interface attachment carried by this task event.
    #[must_use]
    pub const fn attachment(&self) -> Option<&EniAttachment> {
        self.attachment.as_ref()
    }

    /// When the first image pull started.
    #[must_use]
    pub const fn pull_started_at(&self) -> Option<DateTime<Utc>> {
        self.pull_started_at
    }

    /// When the last image pull finished.
    #[must_use]
    pub const fn pull_stopped_at(&self) -> Option<DateTime<Utc>> {
        self.pull_stopped_at
    }

    /// When the essential container stopped.
    #[must_use]
    pub const fn execution_stopped_at(&self) -> Option<DateTime<Utc>> {
        self.execution_stopped_at
    }

    /// Sent status of the task when the event was built.
    #[must_use]
    pub const fn known_sent_status(&self) -> TaskStatus {
        self.known_sent_status
    }
}

impl fmt::Display for TaskStateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.task_arn, self.status)?;
        if !self.reason.is_empty() {
            write!(f, ", Reason {}", self.reason)?;
        }
        write!(f, ", Known Sent: {}", self.known_sent_status)?;
        for (label, at) in [
            ("PullStartedAt", self.pull_started_at),
            ("PullStoppedAt", self.pull_stopped_at),
            ("ExecutionStoppedAt", self.execution_stopped_at),
        ] {
            if let Some(at) = at {
                write!(f, ", {label}: {}", at.to_rfc3339())?;
            }
        }
        if let Some(attachment) = &self.attachment {
            write!(f, ", {attachment}")?;
        }
        for change in &self.containers {
            write!(f, ", {change}")?;
        }
        Ok(())
    }
}
