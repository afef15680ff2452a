//! Task and container status enumerations.
//!
//! Both enumerations are totally ordered by lifecycle progress: a status
//! compares greater than every status that precedes it. The "already
//! sent" check relies on this order.

use std::fmt;
use std::str::FromStr;

use berth_common::error::BerthError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Nothing has happened yet.
    #[default]
    None,
    /// All images have been pulled.
    Pulled,
    /// All containers have been created.
    Created,
    /// All essential containers are running.
    Running,
    /// The task has stopped.
    Stopped,
}

impl TaskStatus {
    const ALL: [Self; 5] = [
        Self::None,
        Self::Pulled,
        Self::Created,
        Self::Running,
        Self::Stopped,
    ];

    /// Returns the upper-case name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Pulled => "PULLED",
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
        }
    }

    /// Whether the control plane accepts this status in a task event.
    #[must_use]
    pub const fn backend_recognized(self) -> bool {
        matches!(self, Self::Created | Self::Running | Self::Stopped)
    }

    /// The status string the control plane expects for this status.
    ///
    /// Everything short of running is reported as `PENDING`.
    #[must_use]
    pub const fn backend_status(self) -> &'static str {
        match self {
            Self::Running | Self::Stopped => self.as_str(),
            Self::None | Self::Pulled | Self::Created => "PENDING",
        }
    }

    /// Whether the task has reached its final status.
    #[must_use]
    pub const fn terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = BerthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BerthError::InvalidStatus {
                kind: "task",
                value: s.to_owned(),
            })
    }
}

/// Lifecycle status of a container.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    /// Nothing has happened yet.
    #[default]
    None,
    /// The image has been pulled.
    Pulled,
    /// The container has been created.
    Created,
    /// The container process is running.
    Running,
    /// Resources the container provides to its task are set up.
    ResourcesProvisioned,
    /// The container has stopped.
    Stopped,
    /// The container is gone and can no longer be inspected.
    Zombie,
}

impl ContainerStatus {
    const ALL: [Self; 7] = [
        Self::None,
        Self::Pulled,
        Self::Created,
        Self::Running,
        Self::ResourcesProvisioned,
        Self::Stopped,
        Self::Zombie,
    ];

    /// Returns the upper-case name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Pulled => "PULLED",
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::ResourcesProvisioned => "RESOURCES_PROVISIONED",
            Self::Stopped => "STOPPED",
            Self::Zombie => "ZOMBIE",
        }
    }

    /// Whether a container in this status is reported, given the status
    /// that counts as its steady state.
    ///
    /// Only the steady state and `Stopped` are reported.
    #[must_use]
    pub fn should_report_to_backend(self, steady_state: Self) -> bool {
        self == steady_state || self == Self::Stopped
    }

    /// Maps this status to the one the control plane sees.
    ///
    /// The steady state is presented as `Running` whatever it is for the
    /// agent; `Stopped` is passed through; anything else maps to `None`.
    #[must_use]
    pub fn backend_status(self, steady_state: Self) -> Self {
        if self == steady_state {
            Self::Running
        } else if self == Self::Stopped {
            Self::Stopped
        } else {
            Self::None
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = BerthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BerthError::InvalidStatus {
                kind: "container",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_statuses_are_ordered_by_progress() {
        assert!(TaskStatus::None < TaskStatus::Pulled);
        assert!(TaskStatus::Pulled < TaskStatus::Created);
        assert!(TaskStatus::Created < TaskStatus::Running);
        assert!(TaskStatus::Running < TaskStatus::Stopped);
    }

    #[test]
    fn only_created_running_and_stopped_are_recognized() {
        let recognized: Vec<_> = TaskStatus::ALL
            .into_iter()
            .filter(|s| s.backend_recognized())
            .collect();
        assert_eq!(
            recognized,
            vec![TaskStatus::Created, TaskStatus::Running, TaskStatus::Stopped]
        );
    }

    #[test]
    fn task_backend_status_collapses_early_statuses_to_pending() {
        assert_eq!(TaskStatus::Created.backend_status(), "PENDING");
        assert_eq!(TaskStatus::Running.backend_status(), "RUNNING");
        assert_eq!(TaskStatus::Stopped.backend_status(), "STOPPED");
    }

    #[test]
    fn container_default_steady_state_reports_running_and_stopped() {
        let steady = ContainerStatus::Running;
        assert!(ContainerStatus::Running.should_report_to_backend(steady));
        assert!(ContainerStatus::Stopped.should_report_to_backend(steady));
        assert!(!ContainerStatus::Created.should_report_to_backend(steady));
        assert!(!ContainerStatus::ResourcesProvisioned.should_report_to_backend(steady));
    }

    #[test]
    fn resources_provisioned_steady_state_hides_running() {
        let steady = ContainerStatus::ResourcesProvisioned;
        assert!(!ContainerStatus::Running.should_report_to_backend(steady));
        assert!(ContainerStatus::ResourcesProvisioned.should_report_to_backend(steady));
        assert_eq!(
            ContainerStatus::ResourcesProvisioned.backend_status(steady),
            ContainerStatus::Running
        );
        assert_eq!(
            ContainerStatus::Running.backend_status(steady),
            ContainerStatus::None
        );
    }

    #[test]
    fn stopped_maps_to_stopped_for_any_steady_state() {
        for steady in [ContainerStatus::Running, ContainerStatus::ResourcesProvisioned] {
            assert_eq!(
                ContainerStatus::Stopped.backend_status(steady),
                ContainerStatus::Stopped
            );
        }
    }

    #[test]
    fn statuses_parse_from_their_names() {
        for status in ContainerStatus::ALL {
            assert_eq!(status.as_str().parse::<ContainerStatus>().unwrap(), status);
        }
        assert_eq!("running".parse::<TaskStatus>().unwrap(), TaskStatus::Running);
        assert!("PENDING".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&ContainerStatus::ResourcesProvisioned).unwrap();
        assert_eq!(json, "\"RESOURCES_PROVISIONED\"");
        let back: TaskStatus = serde_json::from_str("\"STOPPED\"").unwrap();
        assert_eq!(back, TaskStatus::Stopped);
    }
}
