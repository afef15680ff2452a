//! Identifier types shared across the Berth workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a task, as assigned by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskArn(String);

impl TaskArn {
    /// Creates a task ARN from a string value.
    #[must_use]
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TaskArn {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskArn {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifies a container by its owning task and its name.
///
/// Container names are only unique within a task, so both parts are
/// needed to find the container again in the agent's state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerKey {
    /// ARN of the owning task.
    pub task_arn: TaskArn,
    /// Container name within the task.
    pub name: String,
}

impl ContainerKey {
    /// Creates a container key.
    #[must_use]
    pub fn new(task_arn: TaskArn, name: impl Into<String>) -> Self {
        Self {
            task_arn,
            name: name.into(),
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.task_arn, self.name)
    }
}
