//! In-memory runner adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::project::{ProjectPath, Role};
use crate::runner::{
    domain::{Runner, RunnerId},
    ports::{
        AssignOutcome, RunnerRepository, RunnerRepositoryError, RunnerRepositoryResult,
        StopOutcome, WorkGate, WorkGateResult,
    },
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory runner repository.
///
/// The write lock makes each conditional update atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunnerRepository {
    runners: Arc<RwLock<Vec<Runner>>>,
}

impl InMemoryRunnerRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> RunnerRepositoryError {
    RunnerRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn find_mut(runners: &mut [Runner], id: RunnerId) -> RunnerRepositoryResult<&mut Runner> {
    runners
        .iter_mut()
        .find(|runner| runner.id() == id)
        .ok_or(RunnerRepositoryError::NotFound(id))
}

#[async_trait]
impl RunnerRepository for InMemoryRunnerRepository {
    async fn register(&self, runner: &Runner) -> RunnerRepositoryResult<()> {
        let mut runners = self.runners.write().map_err(lock_error)?;
        if runners.iter().any(|stored| stored.id() == runner.id()) {
            return Err(RunnerRepositoryError::Duplicate(runner.id()));
        }
        runners.push(runner.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: RunnerId) -> RunnerRepositoryResult<Option<Runner>> {
        let runners = self.runners.read().map_err(lock_error)?;
        Ok(runners.iter().find(|runner| runner.id() == id).cloned())
    }

    async fn touch(&self, id: RunnerId, at: DateTime<Utc>) -> RunnerRepositoryResult<Runner> {
        let mut runners = self.runners.write().map_err(lock_error)?;
        let runner = find_mut(&mut runners, id)?;
        runner.touch(at);
        Ok(runner.clone())
    }

    async fn try_assign(
        &self,
        id: RunnerId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> RunnerRepositoryResult<AssignOutcome> {
        let mut runners = self.runners.write().map_err(lock_error)?;
        if let Some(holder) = runners
            .iter()
            .find(|runner| runner.id() != id && runner.current_task_id() == Some(task_id))
        {
            return Ok(AssignOutcome::TaskHeldBy(holder.id()));
        }
        let runner = find_mut(&mut runners, id)?;
        if let Some(held) = runner.current_task_id() {
            return Ok(AssignOutcome::RunnerBusy(held));
        }
        if !runner.assign(task_id, at) {
            return Ok(AssignOutcome::RunnerStopped);
        }
        Ok(AssignOutcome::Assigned(runner.clone()))
    }

    async fn clear_assignment(&self, id: RunnerId) -> RunnerRepositoryResult<Runner> {
        let mut runners = self.runners.write().map_err(lock_error)?;
        let runner = find_mut(&mut runners, id)?;
        runner.clear();
        Ok(runner.clone())
    }

    async fn release_if_holding(
        &self,
        id: RunnerId,
        task_id: TaskId,
    ) -> RunnerRepositoryResult<bool> {
        let mut runners = self.runners.write().map_err(lock_error)?;
        let runner = find_mut(&mut runners, id)?;
        if runner.current_task_id() != Some(task_id) {
            return Ok(false);
        }
        runner.clear();
        Ok(true)
    }

    async fn stop(&self, id: RunnerId) -> RunnerRepositoryResult<StopOutcome> {
        let mut runners = self.runners.write().map_err(lock_error)?;
        let runner = find_mut(&mut runners, id)?;
        if let Some(held) = runner.current_task_id() {
            return Ok(StopOutcome::Busy(held));
        }
        runner.stop();
        Ok(StopOutcome::Stopped(runner.clone()))
    }

    async fn list(&self) -> RunnerRepositoryResult<Vec<Runner>> {
        let runners = self.runners.read().map_err(lock_error)?;
        Ok(runners.clone())
    }
}

/// Gate that never blocks any role.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWorkGate;

#[async_trait]
impl WorkGate for OpenWorkGate {
    async fn blocked_roles(&self, _project: &ProjectPath) -> WorkGateResult<Vec<Role>> {
        Ok(Vec::new())
    }
}
