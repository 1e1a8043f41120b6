//! Events published after task state changes.

use super::{AuditEntry, Task};
use crate::project::ProjectPath;
use chrono::{DateTime, Utc};

/// A committed transition together with its audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTransition {
    /// Task state after the transition.
    pub task: Task,
    /// Audit entry written for the transition.
    pub entry: AuditEntry,
}

/// Lifecycle events fanned out to hooks and other observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// A new pending task was stored.
    Created(Task),
    /// A task changed status.
    Transitioned(TaskTransition),
    /// The last open task of a project reached a terminal status.
    ProjectCompleted {
        /// Project whose tasks are all terminal.
        project: ProjectPath,
        /// When the final transition happened.
        at: DateTime<Utc>,
    },
}
