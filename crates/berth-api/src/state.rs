//! Agent state index.
//!
//! Holds the tasks the agent manages, keyed by ARN, and records which
//! statuses have been delivered. Snapshots never point back at their
//! source entity; the delivery layer hands a delivered snapshot back here
//! and the entity is found again through the snapshot's key.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use berth_common::error::{BerthError, Result};
use berth_common::types::{ContainerKey, TaskArn};
use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::event::Event;
use crate::statechange::{ContainerStateChange, TaskStateChange};
use crate::task::{Task, TaskRecord};

/// On-disk layout of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    tasks: Vec<TaskRecord>,
}

/// The set of tasks known to the agent.
#[derive(Debug, Default)]
pub struct AgentState {
    tasks: BTreeMap<TaskArn, Arc<Task>>,
}

impl AgentState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task, replacing any task with the same ARN.
    pub fn insert(&mut self, task: Task) -> Arc<Task> {
        let task = Arc::new(task);
        if self
            .tasks
            .insert(task.arn().clone(), Arc::clone(&task))
            .is_some()
        {
            tracing::debug!(task_arn = %task.arn(), "replaced existing task");
        }
        task
    }

    /// Looks up a task by ARN.
    #[must_use]
    pub fn task(&self, arn: &TaskArn) -> Option<Arc<Task>> {
        self.tasks.get(arn).cloned()
    }

    /// Iterates over all tasks in ARN order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.values()
    }

    /// Number of tracked tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Records that a task event has been delivered.
    ///
    /// # Errors
    ///
    /// Returns [`BerthError::NotFound`] if the task is no longer tracked.
    pub fn mark_task_sent(&self, change: &TaskStateChange) -> Result<()> {
        let task = self.lookup(change.key())?;
        task.set_sent_status(change.status());
        tracing::debug!(task_arn = %change.key(), status = %change.status(), "task status marked sent");
        Ok(())
    }

    /// Records that a container event has been delivered.
    ///
    /// The container's sent status becomes the agent status it had when
    /// the event was built.
    ///
    /// # Errors
    ///
    /// Returns [`BerthError::NotFound`] if the task or container is no
    /// longer tracked.
    pub fn mark_container_sent(&self, change: &ContainerStateChange) -> Result<()> {
        let key = change.key();
        let task = self.lookup(&key.task_arn)?;
        let container = find_container(&task, &key)?;
        container.set_sent_status(change.agent_status());
        tracing::debug!(container = %key, status = %change.agent_status(), "container status marked sent");
        Ok(())
    }

    /// Records a delivered event.
    ///
    /// A task event also marks every container event it carries. All
    /// referenced entities are resolved before any status changes, so a
    /// missing one leaves the state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BerthError::NotFound`] if any referenced entity is no
    /// longer tracked.
    pub fn mark_sent(&self, event: &Event) -> Result<()> {
        match event {
            Event::Container(change) => self.mark_container_sent(change),
            Event::Task(change) => self.mark_task_with_containers_sent(change),
        }
    }

    fn mark_task_with_containers_sent(&self, change: &TaskStateChange) -> Result<()> {
        let task = self.lookup(change.key())?;
        let mut resolved = Vec::with_capacity(change.containers().len());
        for container in change.containers() {
            let key = container.key();
            let owner = self.lookup(&key.task_arn)?;
            let index = owner
                .containers()
                .iter()
                .position(|c| c.name() == key.name)
                .ok_or_else(|| BerthError::NotFound {
                    kind: "container",
                    id: key.to_string(),
                })?;
            resolved.push((owner, index, container.agent_status()));
        }

        for (owner, index, status) in &resolved {
            let Some(container) = owner.containers().get(*index) else {
                continue;
            };
            container.set_sent_status(*status);
            tracing::debug!(task_arn = %owner.arn(), container = container.name(), status = %status, "container status marked sent");
        }
        task.set_sent_status(change.status());
        tracing::debug!(task_arn = %change.key(), status = %change.status(), "task status marked sent");
        Ok(())
    }

    /// Builds the events that are currently worth reporting, in ARN order.
    ///
    /// A task with a reportable status yields one task event carrying its
    /// container events. A task whose own status cannot be reported (already
    /// sent or not recognized by the backend) still yields each of its
    /// container events on its own.
    #[must_use]
    pub fn pending_events(&self, reason: &str) -> Vec<Event> {
        let mut events = Vec::new();
        for task in self.tasks.values() {
            let containers = TaskStateChange::container_changes(task, reason);
            match TaskStateChange::new(task, reason) {
                Ok(change) => {
                    let change = change.with_container_changes(containers);
                    if change.should_be_reported() {
                        events.push(Event::Task(change));
                    }
                }
                Err(e) => {
                    tracing::trace!(task_arn = %task.arn(), reason = %e, "no task event");
                    events.extend(containers.into_iter().map(Event::Container));
                }
            }
        }
        events
    }

    /// Loads the state from a JSON file. A missing file yields an empty
    /// state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading agent state");
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|e| BerthError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: StateFile = serde_json::from_str(&content)?;
        let mut state = Self::new();
        for record in file.tasks {
            let _ = state.insert(Task::from_record(record));
        }
        Ok(state)
    }

    /// Persists the state to a JSON file.
    ///
    /// Writes a sibling temporary file and renames it over `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), tasks = self.tasks.len(), "saving agent state");
        let file = StateFile {
            tasks: self.tasks.values().map(|t| t.to_record()).collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| BerthError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| BerthError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, path).map_err(|e| BerthError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    fn lookup(&self, arn: &TaskArn) -> Result<Arc<Task>> {
        self.task(arn).ok_or_else(|| BerthError::NotFound {
            kind: "task",
            id: arn.to_string(),
        })
    }
}

fn find_container<'a>(task: &'a Task, key: &ContainerKey) -> Result<&'a Container> {
    task.container(&key.name).ok_or_else(|| BerthError::NotFound {
        kind: "container",
        id: key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ContainerStatus, TaskStatus};

    fn running_task(arn: &str) -> Task {
        let web = Container::new("web");
        web.set_known_status(ContainerStatus::Running);
        let task = Task::new(arn, vec![web]);
        task.set_known_status(TaskStatus::Running);
        task
    }

    #[test]
    fn mark_sent_updates_task_and_containers() {
        let mut state = AgentState::new();
        let task = state.insert(running_task("t1"));

        let events = state.pending_events("");
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Task(change) if change.containers().len() == 1));
        state.mark_sent(&events[0]).expect("mark sent");

        assert_eq!(task.sent_status(), TaskStatus::Running);
        assert_eq!(
            task.container("web").map(Container::sent_status),
            Some(ContainerStatus::Running)
        );
        assert!(state.pending_events("").is_empty());
    }

    #[test]
    fn mark_container_sent_uses_agent_status() {
        let mut state = AgentState::new();
        let app = Container::new("app").with_steady_state(ContainerStatus::ResourcesProvisioned);
        app.set_known_status(ContainerStatus::ResourcesProvisioned);
        let task = state.insert(Task::new("t1", vec![app]));
        let app = task.container("app").expect("container");

        let change = ContainerStateChange::new(&task, app, "").expect("event");
        state.mark_container_sent(&change).expect("mark sent");

        assert_eq!(app.sent_status(), ContainerStatus::ResourcesProvisioned);
        assert!(ContainerStateChange::new(&task, app, "").is_err());
    }

    #[test]
    fn mark_sent_for_unknown_task_is_not_found() {
        let other = running_task("gone");
        let change = TaskStateChange::new(&other, "").expect("event");
        let state = AgentState::new();
        let err = state.mark_task_sent(&change).unwrap_err();
        assert!(matches!(err, BerthError::NotFound { kind: "task", .. }));
    }

    #[test]
    fn pending_events_are_in_arn_order_and_filtered() {
        let mut state = AgentState::new();
        let _ = state.insert(running_task("b"));
        let _ = state.insert(running_task("a"));
        let pulled = Task::new("c", Vec::new());
        pulled.set_known_status(TaskStatus::Pulled);
        let _ = state.insert(pulled);
        let created = Task::new("d", Vec::new());
        created.set_known_status(TaskStatus::Created);
        let _ = state.insert(created);

        let arns: Vec<_> = state
            .pending_events("")
            .iter()
            .map(|e| match e {
                Event::Task(change) => change.task_arn().to_string(),
                Event::Container(change) => change.task_arn().to_string(),
            })
            .collect();
        assert_eq!(arns, vec!["a", "b"]);
    }

    #[test]
    fn container_change_is_pending_when_task_status_already_sent() {
        let mut state = AgentState::new();
        let app = Container::new("app");
        app.set_known_status(ContainerStatus::Running);
        app.set_sent_status(ContainerStatus::Running);
        let sidecar = Container::new("sidecar");
        sidecar.set_known_status(ContainerStatus::Stopped);
        sidecar.set_sent_status(ContainerStatus::Running);
        sidecar.set_known_exit_code(1);
        let task = Task::new("t1", vec![app, sidecar]);
        task.set_known_status(TaskStatus::Running);
        task.set_sent_status(TaskStatus::Running);
        let task = state.insert(task);

        let events = state.pending_events("");
        assert_eq!(events.len(), 1);
        let Event::Container(change) = &events[0] else {
            unreachable!("expected a container event, got {:?}", events[0]);
        };
        assert_eq!(change.container_name(), "sidecar");
        assert_eq!(change.exit_code(), Some(1));
        assert_eq!(
            events[0].to_string(),
            "t1 sidecar -> STOPPED, Exit 1, Known Sent: RUNNING"
        );

        state.mark_sent(&events[0]).expect("mark sent");
        assert_eq!(
            task.container("sidecar").map(Container::sent_status),
            Some(ContainerStatus::Stopped)
        );
        assert_eq!(task.sent_status(), TaskStatus::Running);
        assert!(state.pending_events("").is_empty());
    }

    #[test]
    fn container_changes_are_pending_for_unrecognized_task_status() {
        let mut state = AgentState::new();
        let web = Container::new("web");
        web.set_known_status(ContainerStatus::Running);
        let task = Task::new("t1", vec![web]);
        task.set_known_status(TaskStatus::Pulled);
        let _ = state.insert(task);

        let events = state.pending_events("");
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Container(change) if change.container_name() == "web"));
    }

    #[test]
    fn mark_sent_with_unknown_container_changes_nothing() {
        let mut state = AgentState::new();
        let task = state.insert(running_task("t1"));

        let web = Container::new("web");
        web.set_known_status(ContainerStatus::Running);
        let extra = Container::new("extra");
        extra.set_known_status(ContainerStatus::Running);
        let stale = Task::new("t1", vec![web, extra]);
        stale.set_known_status(TaskStatus::Running);
        let containers = TaskStateChange::container_changes(&stale, "");
        let change = TaskStateChange::new(&stale, "")
            .expect("event")
            .with_container_changes(containers);

        let err = state.mark_sent(&Event::Task(change)).unwrap_err();
        assert!(matches!(err, BerthError::NotFound { kind: "container", .. }));
        assert_eq!(task.sent_status(), TaskStatus::None);
        assert_eq!(
            task.container("web").map(Container::sent_status),
            Some(ContainerStatus::None)
        );
    }

    #[test]
    fn entities_and_state_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Task>();
        assert_send_sync::<Container>();
        assert_send_sync::<AgentState>();
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state").join("state.json");

        let mut state = AgentState::new();
        let _ = state.insert(running_task("t1"));
        state.save(&path).expect("save");

        let loaded = AgentState::load(&path).expect("load");
        assert_eq!(loaded.len(), 1);
        let task = loaded.task(&TaskArn::from("t1")).expect("task");
        assert_eq!(task.known_status(), TaskStatus::Running);
        assert_eq!(task.containers().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AgentState::load(&dir.path().join("absent.json")).expect("load");
        assert!(state.is_empty());
    }
}
