//! Runner aggregate.

use super::{HeartbeatPolicy, Liveness};
use crate::project::ProjectPath;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a registered runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunnerId(Uuid);

impl RunnerId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runner lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStatus {
    /// Registered and waiting for work.
    Idle,
    /// Holding a task.
    Active,
    /// Shut down; never claims again.
    Stopped,
}

impl RunnerStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Stopped => "stopped",
        }
    }
}

/// Error returned while parsing stored runner statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown runner status: {0}")]
pub struct ParseRunnerStatusError(pub String);

impl TryFrom<&str> for RunnerStatus {
    type Error = ParseRunnerStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "idle" => Ok(Self::Idle),
            "active" => Ok(Self::Active),
            "stopped" => Ok(Self::Stopped),
            _ => Err(ParseRunnerStatusError(value.to_owned())),
        }
    }
}

/// Parameter object for reconstructing a persisted runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRunnerData {
    /// Runner identifier.
    pub id: RunnerId,
    /// Project served by the runner.
    pub project: ProjectPath,
    /// Host-local process identifier.
    pub pid: Option<u32>,
    /// Lifecycle status.
    pub status: RunnerStatus,
    /// Task currently held.
    pub current_task_id: Option<TaskId>,
    /// Registration timestamp.
    pub started_at: DateTime<Utc>,
    /// Last heartbeat timestamp.
    pub heartbeat_at: DateTime<Utc>,
}

/// A registered runner process.
///
/// A runner holding a task is always [`RunnerStatus::Active`]; mutation goes
/// through the methods below so that pairing cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    id: RunnerId,
    project: ProjectPath,
    pid: Option<u32>,
    status: RunnerStatus,
    current_task_id: Option<TaskId>,
    started_at: DateTime<Utc>,
    heartbeat_at: DateTime<Utc>,
}

impl Runner {
    /// Registers a new idle runner.
    #[must_use]
    pub fn register(project: ProjectPath, pid: Option<u32>, clock: &impl Clock) -> Self {
        let now = clock.utc();
        Self {
            id: RunnerId::new(),
            project,
            pid,
            status: RunnerStatus::Idle,
            current_task_id: None,
            started_at: now,
            heartbeat_at: now,
        }
    }

    /// Reconstructs a runner from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRunnerData) -> Self {
        Self {
            id: data.id,
            project: data.project,
            pid: data.pid,
            status: data.status,
            current_task_id: data.current_task_id,
            started_at: data.started_at,
            heartbeat_at: data.heartbeat_at,
        }
    }

    /// Records a heartbeat at `at`.
    pub const fn touch(&mut self, at: DateTime<Utc>) {
        self.heartbeat_at = at;
    }

    /// Takes `task_id`, moving the runner to `active`.
    ///
    /// Returns `false` without changes when the runner already holds a task
    /// or has stopped.
    pub fn assign(&mut self, task_id: TaskId, at: DateTime<Utc>) -> bool {
        if self.current_task_id.is_some() || self.status == RunnerStatus::Stopped {
            return false;
        }
        self.current_task_id = Some(task_id);
        self.status = RunnerStatus::Active;
        self.heartbeat_at = at;
        true
    }

    /// Drops the held task and returns to `idle`. Returns the released task.
    pub const fn clear(&mut self) -> Option<TaskId> {
        let released = self.current_task_id.take();
        if !matches!(self.status, RunnerStatus::Stopped) {
            self.status = RunnerStatus::Idle;
        }
        released
    }

    /// Stops the runner. Returns `false` while it still holds a task.
    pub const fn stop(&mut self) -> bool {
        if self.current_task_id.is_some() {
            return false;
        }
        self.status = RunnerStatus::Stopped;
        true
    }

    /// Classifies the runner's health under `policy`.
    #[must_use]
    pub fn liveness(&self, policy: &HeartbeatPolicy, now: DateTime<Utc>) -> Liveness {
        if self.status == RunnerStatus::Stopped {
            return Liveness::Stopped;
        }
        policy.liveness(self.heartbeat_at, now)
    }

    /// Returns the runner identifier.
    #[must_use]
    pub const fn id(&self) -> RunnerId {
        self.id
    }

    /// Returns the served project.
    #[must_use]
    pub const fn project(&self) -> &ProjectPath {
        &self.project
    }

    /// Returns the host-local process identifier.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> RunnerStatus {
        self.status
    }

    /// Returns the task currently held.
    #[must_use]
    pub const fn current_task_id(&self) -> Option<TaskId> {
        self.current_task_id
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the last heartbeat timestamp.
    #[must_use]
    pub const fn heartbeat_at(&self) -> DateTime<Utc> {
        self.heartbeat_at
    }
}

/// One `(runner, task)` pairing in the cluster-wide "running now" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTask {
    /// Holding runner.
    pub runner_id: RunnerId,
    /// Project served by the runner.
    pub project: ProjectPath,
    /// Held task.
    pub task_id: TaskId,
    /// Runner liveness at listing time.
    pub liveness: Liveness,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    fn runner() -> Runner {
        let project = ProjectPath::new("/work/app").expect("valid project path");
        Runner::register(project, Some(4242), &DefaultClock)
    }

    #[test]
    fn assignment_pairs_task_with_active_status() {
        let mut idle = runner();
        let task_id = TaskId::new();

        assert!(idle.assign(task_id, DefaultClock.utc()));
        assert_eq!(idle.status(), RunnerStatus::Active);
        assert!(!idle.assign(TaskId::new(), DefaultClock.utc()));
        assert_eq!(idle.current_task_id(), Some(task_id));

        assert_eq!(idle.clear(), Some(task_id));
        assert_eq!(idle.status(), RunnerStatus::Idle);
    }

    #[test]
    fn busy_runner_cannot_stop() {
        let mut busy = runner();
        busy.assign(TaskId::new(), DefaultClock.utc());
        assert!(!busy.stop());
        busy.clear();
        assert!(busy.stop());
        assert!(!busy.assign(TaskId::new(), DefaultClock.utc()));
    }
}
