//! Reasons a state-change event is not produced.
//!
//! None of these is an operational failure: each one means "no event for
//! this invocation". The caller decides how loudly to log them.

use berth_common::types::TaskArn;
use thiserror::Error;

/// Why an event constructor declined to build a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateChangeError {
    /// The entity's known status is not one the control plane accepts.
    #[error("status not recognized by the control plane: {status}; task: {task_arn}")]
    UnrecognizedStatus {
        /// Task the entity belongs to.
        task_arn: TaskArn,
        /// Name of the container, for container events.
        container: Option<String>,
        /// The rejected status.
        status: String,
    },

    /// The known status has already been reported.
    #[error("status [{status}] already sent for {}", describe(.task_arn, .container.as_deref()))]
    AlreadySent {
        /// Task the entity belongs to.
        task_arn: TaskArn,
        /// Name of the container, for container events.
        container: Option<String>,
        /// The status that was already sent.
        status: String,
    },

    /// The container exists only for the agent and is never reported.
    #[error("internal container: {container}")]
    InternalContainer {
        /// Task the container belongs to.
        task_arn: TaskArn,
        /// Name of the container.
        container: String,
    },
}

fn describe(task_arn: &TaskArn, container: Option<&str>) -> String {
    container.map_or_else(
        || format!("task {task_arn}"),
        |name| format!("container {name}, task {task_arn}"),
    )
}

impl StateChangeError {
    /// Whether this outcome is an expected policy decision rather than a
    /// sign of a status the caller should not have asked about.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::AlreadySent { .. } | Self::InternalContainer { .. })
    }

    /// ARN of the task the rejected event was for.
    #[must_use]
    pub const fn task_arn(&self) -> &TaskArn {
        match self {
            Self::UnrecognizedStatus { task_arn, .. }
            | Self::AlreadySent { task_arn, .. }
            | Self::InternalContainer { task_arn, .. } => task_arn,
        }
    }
}
