//! Versioned hook event taxonomy.

use super::ParseHookValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the event taxonomy carried in every payload.
///
/// Adding, removing or renaming an event bumps this number.
pub const HOOK_TAXONOMY_VERSION: u32 = 1;

/// Lifecycle event a hook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookEvent {
    /// A task was created in `pending`.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A runner claimed a task.
    #[serde(rename = "task.started")]
    TaskStarted,
    /// A task was submitted for review.
    #[serde(rename = "task.review")]
    TaskReview,
    /// A reviewer sent a task back.
    #[serde(rename = "task.rejected")]
    TaskRejected,
    /// A claim was released without finishing the task.
    #[serde(rename = "task.released")]
    TaskReleased,
    /// A task was approved.
    #[serde(rename = "task.completed")]
    TaskCompleted,
    /// A task failed.
    #[serde(rename = "task.failed")]
    TaskFailed,
    /// A task was skipped.
    #[serde(rename = "task.skipped")]
    TaskSkipped,
    /// A task landed partially.
    #[serde(rename = "task.partial")]
    TaskPartial,
    /// Coder and reviewer reached a deadlock.
    #[serde(rename = "task.disputed")]
    TaskDisputed,
    /// An operator sent a finished task back to `pending`.
    #[serde(rename = "task.restarted")]
    TaskRestarted,
    /// Every task of a project is terminal.
    #[serde(rename = "project.completed")]
    ProjectCompleted,
}

impl HookEvent {
    /// Every event of the current taxonomy.
    pub const ALL: [Self; 12] = [
        Self::TaskCreated,
        Self::TaskStarted,
        Self::TaskReview,
        Self::TaskRejected,
        Self::TaskReleased,
        Self::TaskCompleted,
        Self::TaskFailed,
        Self::TaskSkipped,
        Self::TaskPartial,
        Self::TaskDisputed,
        Self::TaskRestarted,
        Self::ProjectCompleted,
    ];

    /// Returns the dotted wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::TaskStarted => "task.started",
            Self::TaskReview => "task.review",
            Self::TaskRejected => "task.rejected",
            Self::TaskReleased => "task.released",
            Self::TaskCompleted => "task.completed",
            Self::TaskFailed => "task.failed",
            Self::TaskSkipped => "task.skipped",
            Self::TaskPartial => "task.partial",
            Self::TaskDisputed => "task.disputed",
            Self::TaskRestarted => "task.restarted",
            Self::ProjectCompleted => "project.completed",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HookEvent {
    type Error = ParseHookValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == value)
            .ok_or_else(|| ParseHookValueError(value.to_owned()))
    }
}
