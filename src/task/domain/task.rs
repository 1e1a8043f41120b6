//! Task aggregate root.

use super::{TaskDomainError, TaskId, TaskStatus};
use crate::project::ProjectPath;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Optional grouping of tasks into a prioritised section of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    name: String,
    priority: u32,
}

impl SectionRef {
    /// Creates a validated section reference. Lower priority values are
    /// claimed first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySectionName`] when the name is blank.
    pub fn new(name: impl Into<String>, priority: u32) -> Result<Self, TaskDomainError> {
        let normalized = name.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptySectionName);
        }
        Ok(Self {
            name: normalized,
            priority,
        })
    }

    /// Returns the section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the section priority.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }
}

/// Parameter object for creating a new pending task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Project that owns the task.
    pub project: ProjectPath,
    /// Human-readable task title.
    pub title: String,
    /// Optional plan section.
    pub section: Option<SectionRef>,
    /// Optional file the task was extracted from.
    pub source_file: Option<String>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project: ProjectPath,
    title: String,
    status: TaskStatus,
    section: Option<SectionRef>,
    rejection_count: u32,
    source_file: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning project.
    pub project: ProjectPath,
    /// Persisted title.
    pub title: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted section reference, if any.
    pub section: Option<SectionRef>,
    /// Persisted reviewer rejection counter.
    pub rejection_count: u32,
    /// Persisted source file, if any.
    pub source_file: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(params: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let NewTask {
            project,
            title,
            section,
            source_file,
        } = params;
        let normalized_title = title.trim().to_owned();
        if normalized_title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            project,
            title: normalized_title,
            status: TaskStatus::Pending,
            section,
            rejection_count: 0,
            source_file: source_file.filter(|file| !file.trim().is_empty()),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project: data.project,
            title: data.title,
            status: data.status,
            section: data.section,
            rejection_count: data.rejection_count,
            source_file: data.source_file,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project(&self) -> &ProjectPath {
        &self.project
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the plan section, if any.
    #[must_use]
    pub const fn section(&self) -> Option<&SectionRef> {
        self.section.as_ref()
    }

    /// Returns the number of reviewer rejections since the last restart.
    #[must_use]
    pub const fn rejection_count(&self) -> u32 {
        self.rejection_count
    }

    /// Returns the source file, if any.
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the task to `target` when the edge is allowed.
    ///
    /// Returns the status the task held before the transition. Restarting
    /// (any edge into [`TaskStatus::Pending`] from a terminal status) resets
    /// the rejection counter.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] and leaves the task
    /// untouched when the edge is not in the transition table.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        let from = self.status;
        if !from.can_transition_to(target) {
            return Err(TaskDomainError::InvalidTransition {
                task_id: self.id,
                from,
                to: target,
            });
        }
        if from.is_terminal() && target == TaskStatus::Pending {
            self.rejection_count = 0;
        }
        self.status = target;
        self.updated_at = clock.utc();
        Ok(from)
    }

    /// Records one reviewer rejection and returns the new count.
    pub const fn record_rejection(&mut self) -> u32 {
        self.rejection_count = self.rejection_count.saturating_add(1);
        self.rejection_count
    }
}
