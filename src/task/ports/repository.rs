//! Repository port for task, audit trail and dispute persistence.

use crate::project::ProjectPath;
use crate::task::domain::{AuditEntry, Dispute, DisputeId, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Dispute write applied in the same unit of work as a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisputeChange {
    /// No dispute is written.
    Unchanged,
    /// A newly opened dispute is inserted.
    Open(Dispute),
    /// A stored open dispute is replaced by its resolved form.
    Resolve(Dispute),
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Atomically applies a transition.
    ///
    /// The stored task is replaced by `task`, `entry` is appended to the
    /// audit trail and `dispute` is written, only if the stored status still
    /// equals `expected`. All writes happen or none does.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist, [`TaskRepositoryError::StatusConflict`] when another writer
    /// changed the status first, [`TaskRepositoryError::DisputeAlreadyOpen`]
    /// when opening a second dispute and
    /// [`TaskRepositoryError::DisputeNotFound`] when resolving an unknown
    /// one.
    async fn commit_transition(
        &self,
        task: &Task,
        expected: TaskStatus,
        entry: &AuditEntry,
        dispute: &DisputeChange,
    ) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task of a project in creation order.
    async fn list_by_project(&self, project: &ProjectPath) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the audit trail of a task, oldest entry first.
    async fn audit_trail(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<AuditEntry>>;

    /// Returns all audit entries created at or after `since`, oldest first.
    async fn audit_since(&self, since: DateTime<Utc>) -> TaskRepositoryResult<Vec<AuditEntry>>;

    /// Returns the open dispute of a task, if any.
    async fn find_open_dispute(&self, task_id: TaskId) -> TaskRepositoryResult<Option<Dispute>>;

    /// Returns every dispute of a task, oldest first.
    async fn list_disputes(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Dispute>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored status no longer matches the status the transition was
    /// computed from.
    #[error("task {task_id} status changed concurrently: expected {expected}, found {actual}")]
    StatusConflict {
        /// Task identifier.
        task_id: TaskId,
        /// Status the writer expected.
        expected: TaskStatus,
        /// Status actually stored.
        actual: TaskStatus,
    },

    /// The task already has an open dispute.
    #[error("task {0} already has an open dispute")]
    DisputeAlreadyOpen(TaskId),

    /// The dispute was not found.
    #[error("dispute not found: {0}")]
    DisputeNotFound(DisputeId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
