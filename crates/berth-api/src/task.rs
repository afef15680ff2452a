//! Task entity as tracked by the agent.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use berth_common::types::TaskArn;
use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::container::{Container, ContainerRecord};
use crate::status::TaskStatus;

/// Serializable form of a task, as kept in the agent state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task ARN.
    pub arn: TaskArn,
    /// Most recently observed status.
    #[serde(default)]
    pub known_status: TaskStatus,
    /// Highest status already reported.
    #[serde(default)]
    pub sent_status: TaskStatus,
    /// When the first image pull started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_started_at: Option<DateTime<FixedOffset>>,
    /// When the last image pull finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_stopped_at: Option<DateTime<FixedOffset>>,
    /// When the essential container stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_stopped_at: Option<DateTime<FixedOffset>>,
    /// Containers in definition order.
    #[serde(default)]
    pub containers: Vec<ContainerRecord>,
}

#[derive(Debug, Default)]
struct TaskState {
    known_status: TaskStatus,
    sent_status: TaskStatus,
    pull_started_at: Option<DateTime<FixedOffset>>,
    pull_stopped_at: Option<DateTime<FixedOffset>>,
    execution_stopped_at: Option<DateTime<FixedOffset>>,
}

/// A task and the containers it owns.
#[derive(Debug)]
pub struct Task {
    arn: TaskArn,
    containers: Vec<Container>,
    state: RwLock<TaskState>,
}

impl Task {
    /// Creates a task with no status.
    #[must_use]
    pub fn new(arn: impl Into<TaskArn>, containers: Vec<Container>) -> Self {
        Self {
            arn: arn.into(),
            containers,
            state: RwLock::new(TaskState::default()),
        }
    }

    /// Rebuilds a task from its persisted record.
    #[must_use]
    pub fn from_record(record: TaskRecord) -> Self {
        Self {
            arn: record.arn,
            containers: record
                .containers
                .into_iter()
                .map(Container::from_record)
                .collect(),
            state: RwLock::new(TaskState {
                known_status: record.known_status,
                sent_status: record.sent_status,
                pull_started_at: record.pull_started_at,
                pull_stopped_at: record.pull_stopped_at,
                execution_stopped_at: record.execution_stopped_at,
            }),
        }
    }

    /// Captures the task's current state as a record.
    #[must_use]
    pub fn to_record(&self) -> TaskRecord {
        let state = self.read();
        TaskRecord {
            arn: self.arn.clone(),
            known_status: state.known_status,
            sent_status: state.sent_status,
            pull_started_at: state.pull_started_at,
            pull_stopped_at: state.pull_stopped_at,
            execution_stopped_at: state.execution_stopped_at,
            containers: self.containers.iter().map(Container::to_record).collect(),
        }
    }

    /// Task ARN.
    #[must_use]
    pub const fn arn(&self) -> &TaskArn {
        &self.arn
    }

    /// Containers in definition order.
    #[must_use]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Looks up a container by name.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name() == name)
    }

    /// Most recently observed status.
    #[must_use]
    pub fn known_status(&self) -> TaskStatus {
        self.read().known_status
    }

    /// Records a newly observed status.
    pub fn set_known_status(&self, status: TaskStatus) {
        self.write().known_status = status;
    }

    /// Highest status already reported to the control plane.
    #[must_use]
    pub fn sent_status(&self) -> TaskStatus {
        self.read().sent_status
    }

    /// Records that `status` has been reported.
    pub fn set_sent_status(&self, status: TaskStatus) {
        self.write().sent_status = status;
    }

    /// When the first image pull started, if it has.
    #[must_use]
    pub fn pull_started_at(&self) -> Option<DateTime<FixedOffset>> {
        self.read().pull_started_at
    }

    /// Records the pull start time. Only the first call has an effect;
    /// returns whether this call recorded the time.
    pub fn set_pull_started_at<Tz: TimeZone>(&self, at: DateTime<Tz>) -> bool {
        set_once(&mut self.write().pull_started_at, at)
    }

    /// When the last image pull finished, if it has.
    #[must_use]
    pub fn pull_stopped_at(&self) -> Option<DateTime<FixedOffset>> {
        self.read().pull_stopped_at
    }

    /// Records the pull stop time. Only the first call has an effect.
    pub fn set_pull_stopped_at<Tz: TimeZone>(&self, at: DateTime<Tz>) -> bool {
        set_once(&mut self.write().pull_stopped_at, at)
    }

    /// When the essential container stopped, if it has.
    #[must_use]
    pub fn execution_stopped_at(&self) -> Option<DateTime<FixedOffset>> {
        self.read().execution_stopped_at
    }

    /// Records the execution stop time. Only the first call has an effect.
    pub fn set_execution_stopped_at<Tz: TimeZone>(&self, at: DateTime<Tz>) -> bool {
        set_once(&mut self.write().execution_stopped_at, at)
    }

    fn read(&self) -> RwLockReadGuard<'_, TaskState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TaskState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn set_once<Tz: TimeZone>(slot: &mut Option<DateTime<FixedOffset>>, at: DateTime<Tz>) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(at.fixed_offset());
    true
}
