//! Repository port for runner records.

use crate::runner::domain::{Runner, RunnerId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for runner repository operations.
pub type RunnerRepositoryResult<T> = Result<T, RunnerRepositoryError>;

/// Result of a conditional task assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// The runner now holds the task.
    Assigned(Runner),
    /// The runner already holds another task.
    RunnerBusy(TaskId),
    /// The runner has stopped.
    RunnerStopped,
    /// Another runner holds the task.
    TaskHeldBy(RunnerId),
}

/// Result of a conditional stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The runner is stopped.
    Stopped(Runner),
    /// The runner still holds a task and was left running.
    Busy(TaskId),
}

/// Runner persistence contract.
///
/// All mutation is conditional so that "one task per runner" and "one
/// runner per task" hold under concurrent writers.
#[async_trait]
pub trait RunnerRepository: Send + Sync {
    /// Stores a newly registered runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRepositoryError::Duplicate`] when the ID exists.
    async fn register(&self, runner: &Runner) -> RunnerRepositoryResult<()>;

    /// Finds a runner by identifier.
    async fn find_by_id(&self, id: RunnerId) -> RunnerRepositoryResult<Option<Runner>>;

    /// Refreshes the heartbeat and returns the updated runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRepositoryError::NotFound`] for unknown runners.
    async fn touch(&self, id: RunnerId, at: DateTime<Utc>) -> RunnerRepositoryResult<Runner>;

    /// Assigns `task_id` to an idle runner, provided no other runner holds
    /// it.
    async fn try_assign(
        &self,
        id: RunnerId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> RunnerRepositoryResult<AssignOutcome>;

    /// Clears the runner's task and returns the updated runner.
    async fn clear_assignment(&self, id: RunnerId) -> RunnerRepositoryResult<Runner>;

    /// Clears the runner's task only while it still holds `task_id`.
    ///
    /// Returns `true` when the assignment was cleared.
    async fn release_if_holding(
        &self,
        id: RunnerId,
        task_id: TaskId,
    ) -> RunnerRepositoryResult<bool>;

    /// Stops an idle runner.
    async fn stop(&self, id: RunnerId) -> RunnerRepositoryResult<StopOutcome>;

    /// Returns every runner, oldest registration first.
    async fn list(&self) -> RunnerRepositoryResult<Vec<Runner>>;
}

/// Errors returned by runner repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RunnerRepositoryError {
    /// A runner with the same identifier already exists.
    #[error("duplicate runner identifier: {0}")]
    Duplicate(RunnerId),

    /// The runner was not found.
    #[error("runner not found: {0}")]
    NotFound(RunnerId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RunnerRepositoryError {
    /// Wraps a data-quality error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
