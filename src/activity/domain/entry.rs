//! Finished-task records and list filters.

use crate::project::ProjectPath;
use crate::task::domain::{Actor, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One task that reached a terminal status inside a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    /// Finished task.
    pub task_id: TaskId,
    /// Project owning the task.
    pub project: ProjectPath,
    /// Task title.
    pub title: String,
    /// Terminal status the task still holds.
    pub status: TaskStatus,
    /// When the terminal transition was recorded.
    pub finished_at: DateTime<Utc>,
    /// Who made the terminal transition.
    pub actor: Actor,
}

/// A record enriched with the project's external reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    /// The underlying record.
    #[serde(flatten)]
    pub record: ActivityRecord,
    /// Repository URL or similar, when it could be resolved.
    pub reference: Option<String>,
}

impl ActivityEntry {
    /// Wraps a record without a reference.
    #[must_use]
    pub const fn bare(record: ActivityRecord) -> Self {
        Self {
            record,
            reference: None,
        }
    }
}

/// Query for [`ActivityEntry`] listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFilter {
    /// Trailing window in hours.
    pub hours_ago: u32,
    /// Only entries in this status.
    pub status: Option<TaskStatus>,
    /// Only entries of this project.
    pub project: Option<ProjectPath>,
    /// Maximum number of entries.
    pub limit: Option<usize>,
}

impl ActivityFilter {
    /// Matches every finished task of the last `hours_ago` hours.
    #[must_use]
    pub const fn within_hours(hours_ago: u32) -> Self {
        Self {
            hours_ago,
            status: None,
            project: None,
            limit: None,
        }
    }

    /// Restricts the listing to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the listing to one project.
    #[must_use]
    pub fn with_project(mut self, project: ProjectPath) -> Self {
        self.project = Some(project);
        self
    }

    /// Caps the number of entries returned.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` when `record` passes the status and project filters.
    #[must_use]
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.status.is_none_or(|status| status == record.status)
            && self
                .project
                .as_ref()
                .is_none_or(|project| *project == record.project)
    }
}
