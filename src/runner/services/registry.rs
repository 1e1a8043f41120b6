//! Runner registration, heartbeats and the task claim/release contract.

use crate::project::{ProjectPath, Role};
use crate::runner::{
    adapters::memory::OpenWorkGate,
    domain::{
        ActiveTask, HeartbeatPolicy, Liveness, OrphanPolicy, Runner, RunnerId, RunnerStatus,
    },
    ports::{
        AssignOutcome, RunnerRepository, RunnerRepositoryError, StopOutcome, WorkGate,
        WorkGateError,
    },
};
use crate::task::{
    domain::{Actor, Task, TaskDomainError, TaskId, TaskStatus},
    ports::TaskRepository,
    services::{TaskLifecycleError, TaskLifecycleService, TransitionContext},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Roles every claimed task needs before it can finish.
const CLAIM_ROLES: [Role; 2] = [Role::Coder, Role::Reviewer];

/// Result of a claim attempt.
///
/// Losing a race is not an error: the caller moves on to other work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The runner now holds the task, which is `in_progress`.
    Claimed {
        /// Updated runner.
        runner: Runner,
        /// Claimed task.
        task: Task,
    },
    /// The task is no longer claimable; try another one.
    Unavailable(TaskId),
    /// Credit alerts block roles the project needs.
    Paused {
        /// Blocked roles.
        roles: Vec<Role>,
    },
    /// The project has no pending task left.
    NoPendingWork,
}

/// What happened to one orphaned task during a reclaim pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanAction {
    /// The orphan was reported and left alone.
    Reported,
    /// The task went back to `pending` and the runner was retired.
    ReturnedToPending,
    /// The task had already left `in_progress`; only the runner was retired.
    AlreadyMoved,
}

/// One orphaned task found on a stale runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanReport {
    /// Stale runner.
    pub runner_id: RunnerId,
    /// Task it held.
    pub task_id: TaskId,
    /// Liveness at detection time.
    pub liveness: Liveness,
    /// Applied action.
    pub action: OrphanAction,
}

/// Service-level errors for the runner registry.
#[derive(Debug, Error)]
pub enum RunnerRegistryError {
    /// Runner repository operation failed.
    #[error(transparent)]
    Repository(#[from] RunnerRepositoryError),
    /// Task lifecycle operation failed.
    #[error(transparent)]
    Task(#[from] TaskLifecycleError),
    /// The work gate could not be consulted.
    #[error(transparent)]
    Gate(#[from] WorkGateError),
    /// The runner does not exist.
    #[error("runner not found: {0}")]
    RunnerNotFound(RunnerId),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The runner already holds a task.
    #[error("runner {runner_id} already holds task {task_id}")]
    RunnerBusy {
        /// Runner identifier.
        runner_id: RunnerId,
        /// Task held.
        task_id: TaskId,
    },
    /// The runner has stopped.
    #[error("runner {0} is stopped")]
    RunnerStopped(RunnerId),
    /// The task belongs to another project.
    #[error("task {task_id} does not belong to project {project}")]
    ProjectMismatch {
        /// Task identifier.
        task_id: TaskId,
        /// The runner's project.
        project: ProjectPath,
    },
}

/// Result type for runner registry operations.
pub type RunnerRegistryResult<T> = Result<T, RunnerRegistryError>;

/// Runner registry and heartbeat coordinator.
pub struct RunnerRegistryService<R, T, C>
where
    R: RunnerRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    runners: Arc<R>,
    tasks: TaskLifecycleService<T, C>,
    task_repository: Arc<T>,
    gate: Arc<dyn WorkGate>,
    clock: Arc<C>,
    policy: HeartbeatPolicy,
}

impl<R, T, C> Clone for RunnerRegistryService<R, T, C>
where
    R: RunnerRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            runners: Arc::clone(&self.runners),
            tasks: self.tasks.clone(),
            task_repository: Arc::clone(&self.task_repository),
            gate: Arc::clone(&self.gate),
            clock: Arc::clone(&self.clock),
            policy: self.policy,
        }
    }
}

impl<R, T, C> RunnerRegistryService<R, T, C>
where
    R: RunnerRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a registry with the default heartbeat policy and an open
    /// work gate.
    ///
    /// `tasks` must wrap the same repository as `task_repository`.
    #[must_use]
    pub fn new(
        runners: Arc<R>,
        tasks: TaskLifecycleService<T, C>,
        task_repository: Arc<T>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            runners,
            tasks,
            task_repository,
            gate: Arc::new(OpenWorkGate),
            clock,
            policy: HeartbeatPolicy::default(),
        }
    }

    /// Sets the gate consulted before every claim.
    #[must_use]
    pub fn with_work_gate(mut self, gate: Arc<dyn WorkGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Overrides the heartbeat policy.
    #[must_use]
    pub const fn with_heartbeat_policy(mut self, policy: HeartbeatPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a new idle runner for `project`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::Repository`] when persistence fails.
    pub async fn register(
        &self,
        project: ProjectPath,
        pid: Option<u32>,
    ) -> RunnerRegistryResult<Runner> {
        let runner = Runner::register(project, pid, &*self.clock);
        self.runners.register(&runner).await?;
        info!(runner_id = %runner.id(), project = %runner.project(), ?pid, "runner registered");
        Ok(runner)
    }

    /// Refreshes a runner's heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::RunnerNotFound`] for unknown runners.
    pub async fn heartbeat(&self, runner_id: RunnerId) -> RunnerRegistryResult<Runner> {
        self.runners
            .touch(runner_id, self.clock.utc())
            .await
            .map_err(|err| not_found_as(err, runner_id))
    }

    /// Claims `task_id` for `runner_id`.
    ///
    /// The runner row is reserved first, then the task's
    /// `pending -> in_progress` transition runs as a status compare-and-swap.
    /// Of two runners racing for one task exactly one wins; the loser
    /// receives [`ClaimOutcome::Unavailable`], its reservation is dropped and
    /// the task is left untouched.
    ///
    /// Another runner's assignment is never touched here. A runner whose own
    /// task has left `in_progress` and `review` (for example after a
    /// rejection) has its assignment released when it next claims; stale
    /// holders are handled by [`Self::reclaim_orphans`].
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError`] when the runner is unknown, stopped
    /// or busy, when the task is unknown or belongs to another project, or
    /// when storage fails.
    pub async fn claim_task(
        &self,
        runner_id: RunnerId,
        task_id: TaskId,
    ) -> RunnerRegistryResult<ClaimOutcome> {
        let runner = self.claimable_runner(runner_id).await?;
        if let Some(paused) = self.paused(runner.project()).await? {
            return Ok(paused);
        }
        let task = self
            .task_repository
            .find_by_id(task_id)
            .await
            .map_err(TaskLifecycleError::from)?
            .ok_or(RunnerRegistryError::TaskNotFound(task_id))?;
        if task.project() != runner.project() {
            return Err(RunnerRegistryError::ProjectMismatch {
                task_id,
                project: runner.project().clone(),
            });
        }
        self.claim_checked(&runner, task_id).await
    }

    /// Claims the first available pending task of the runner's project.
    ///
    /// Tasks are tried in section priority order, then creation order.
    /// Lost races move on to the next candidate.
    ///
    /// # Errors
    ///
    /// See [`Self::claim_task`].
    pub async fn claim_next(&self, runner_id: RunnerId) -> RunnerRegistryResult<ClaimOutcome> {
        let runner = self.claimable_runner(runner_id).await?;
        if let Some(paused) = self.paused(runner.project()).await? {
            return Ok(paused);
        }
        let mut candidates = self
            .tasks
            .list_by_project(runner.project())
            .await?
            .into_iter()
            .filter(|task| task.status() == TaskStatus::Pending)
            .collect::<Vec<_>>();
        candidates.sort_by_key(|task| {
            (
                task.section().map_or(u32::MAX, |section| section.priority()),
                task.created_at(),
            )
        });

        for candidate in candidates {
            match self.claim_checked(&runner, candidate.id()).await? {
                ClaimOutcome::Unavailable(task_id) => {
                    debug!(%runner_id, %task_id, "candidate taken, trying next");
                }
                outcome => return Ok(outcome),
            }
        }
        Ok(ClaimOutcome::NoPendingWork)
    }

    /// Clears the runner's task and returns it to `idle`.
    ///
    /// The task's own status is left to the lifecycle service. Returns the
    /// released task, if the runner held one.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::RunnerNotFound`] for unknown runners.
    pub async fn release_task(&self, runner_id: RunnerId) -> RunnerRegistryResult<Option<TaskId>> {
        let before = self.load_runner(runner_id).await?;
        self.runners
            .clear_assignment(runner_id)
            .await
            .map_err(|err| not_found_as(err, runner_id))?;
        if let Some(task_id) = before.current_task_id() {
            debug!(%runner_id, %task_id, "runner released task");
        }
        Ok(before.current_task_id())
    }

    /// Stops an idle runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::RunnerBusy`] while the runner still
    /// holds a task.
    pub async fn stop(&self, runner_id: RunnerId) -> RunnerRegistryResult<Runner> {
        match self
            .runners
            .stop(runner_id)
            .await
            .map_err(|err| not_found_as(err, runner_id))?
        {
            StopOutcome::Stopped(runner) => {
                info!(%runner_id, "runner stopped");
                Ok(runner)
            }
            StopOutcome::Busy(task_id) => {
                Err(RunnerRegistryError::RunnerBusy { runner_id, task_id })
            }
        }
    }

    /// Returns a runner's heartbeat-derived health.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::RunnerNotFound`] for unknown runners.
    pub async fn liveness(&self, runner_id: RunnerId) -> RunnerRegistryResult<Liveness> {
        let runner = self.load_runner(runner_id).await?;
        Ok(runner.liveness(&self.policy, self.clock.utc()))
    }

    /// Returns runners that missed the staleness threshold.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::Repository`] when listing fails.
    pub async fn stale_runners(&self) -> RunnerRegistryResult<Vec<Runner>> {
        let now = self.clock.utc();
        Ok(self
            .runners
            .list()
            .await?
            .into_iter()
            .filter(|runner| runner.liveness(&self.policy, now).is_stale())
            .collect())
    }

    /// Lists every `(runner, task)` pairing across all projects.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError::Repository`] when listing fails.
    pub async fn list_active_tasks(&self) -> RunnerRegistryResult<Vec<ActiveTask>> {
        let now = self.clock.utc();
        Ok(self
            .runners
            .list()
            .await?
            .into_iter()
            .filter_map(|runner| {
                runner.current_task_id().map(|task_id| ActiveTask {
                    runner_id: runner.id(),
                    project: runner.project().clone(),
                    task_id,
                    liveness: runner.liveness(&self.policy, now),
                })
            })
            .collect())
    }

    /// Applies the orphan policy to every stale runner holding a task.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerRegistryError`] when storage fails. Tasks that moved
    /// on in the meantime are reported as [`OrphanAction::AlreadyMoved`].
    pub async fn reclaim_orphans(&self) -> RunnerRegistryResult<Vec<OrphanReport>> {
        let now = self.clock.utc();
        let mut reports = Vec::new();
        for runner in self.runners.list().await? {
            let liveness = runner.liveness(&self.policy, now);
            let (true, Some(task_id)) = (liveness.is_stale(), runner.current_task_id()) else {
                continue;
            };
            let action = match self.policy.orphan_policy {
                OrphanPolicy::ReportOnly => {
                    warn!(runner_id = %runner.id(), %task_id, ?liveness, "orphaned task detected");
                    OrphanAction::Reported
                }
                OrphanPolicy::ReturnToPending => self.return_orphan(&runner, task_id).await?,
            };
            reports.push(OrphanReport {
                runner_id: runner.id(),
                task_id,
                liveness,
                action,
            });
        }
        Ok(reports)
    }

    async fn return_orphan(
        &self,
        runner: &Runner,
        task_id: TaskId,
    ) -> RunnerRegistryResult<OrphanAction> {
        let context = TransitionContext::new(Actor::system("orphan-reclaim"))
            .with_notes(format!("runner {} stopped heartbeating", runner.id()));
        let action = match self.tasks.release_claim(task_id, context).await {
            Ok(_) => OrphanAction::ReturnedToPending,
            Err(err) if is_lost_race(&err) => OrphanAction::AlreadyMoved,
            Err(err) => return Err(err.into()),
        };
        self.runners.clear_assignment(runner.id()).await?;
        if let StopOutcome::Busy(held) = self.runners.stop(runner.id()).await? {
            warn!(runner_id = %runner.id(), task_id = %held, "stale runner picked up new work");
        }
        info!(runner_id = %runner.id(), %task_id, ?action, "orphaned task reclaimed");
        Ok(action)
    }

    async fn load_runner(&self, runner_id: RunnerId) -> RunnerRegistryResult<Runner> {
        self.runners
            .find_by_id(runner_id)
            .await?
            .ok_or(RunnerRegistryError::RunnerNotFound(runner_id))
    }

    async fn claimable_runner(&self, runner_id: RunnerId) -> RunnerRegistryResult<Runner> {
        let runner = self.load_runner(runner_id).await?;
        if runner.status() == RunnerStatus::Stopped {
            return Err(RunnerRegistryError::RunnerStopped(runner_id));
        }
        let Some(task_id) = runner.current_task_id() else {
            return Ok(runner);
        };
        if !self.release_settled(runner_id, task_id).await? {
            return Err(RunnerRegistryError::RunnerBusy { runner_id, task_id });
        }
        self.load_runner(runner_id).await
    }

    async fn paused(&self, project: &ProjectPath) -> RunnerRegistryResult<Option<ClaimOutcome>> {
        let blocked = self
            .gate
            .blocked_roles(project)
            .await?
            .into_iter()
            .filter(|role| CLAIM_ROLES.contains(role))
            .collect::<Vec<_>>();
        if blocked.is_empty() {
            return Ok(None);
        }
        debug!(project = %project, roles = ?blocked, "claims paused by credit alerts");
        Ok(Some(ClaimOutcome::Paused { roles: blocked }))
    }

    async fn claim_checked(
        &self,
        runner: &Runner,
        task_id: TaskId,
    ) -> RunnerRegistryResult<ClaimOutcome> {
        let runner_id = runner.id();
        // The runner row is reserved before the task is touched, so a losing
        // claim never writes to the task or its audit trail.
        let reserved = match self
            .runners
            .try_assign(runner_id, task_id, self.clock.utc())
            .await?
        {
            AssignOutcome::Assigned(assigned) => assigned,
            refused => return refused_claim(runner_id, task_id, &refused),
        };

        let context = TransitionContext::new(Actor::system("runner"))
            .with_notes(format!("claimed by runner {runner_id}"));
        match self.tasks.start(task_id, context).await {
            Ok(transition) => {
                info!(%runner_id, %task_id, "task claimed");
                Ok(ClaimOutcome::Claimed {
                    runner: reserved,
                    task: transition.task,
                })
            }
            Err(err) => {
                self.runners.release_if_holding(runner_id, task_id).await?;
                if is_lost_race(&err) {
                    debug!(%runner_id, %task_id, "claim lost");
                    Ok(ClaimOutcome::Unavailable(task_id))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Clears the runner's assignment once `task_id` has left `in_progress`
    /// and `review`, e.g. after a rejection sent it back to `pending`.
    ///
    /// Returns `false` while the task is still being worked.
    async fn release_settled(
        &self,
        runner_id: RunnerId,
        task_id: TaskId,
    ) -> RunnerRegistryResult<bool> {
        let status = self
            .task_repository
            .find_by_id(task_id)
            .await
            .map_err(TaskLifecycleError::from)?
            .map(|task| task.status());
        if matches!(status, Some(TaskStatus::InProgress | TaskStatus::Review)) {
            return Ok(false);
        }
        if self.runners.release_if_holding(runner_id, task_id).await? {
            info!(%runner_id, %task_id, ?status, "settled assignment released");
        }
        Ok(true)
    }
}

fn refused_claim(
    runner_id: RunnerId,
    task_id: TaskId,
    outcome: &AssignOutcome,
) -> RunnerRegistryResult<ClaimOutcome> {
    match outcome {
        AssignOutcome::RunnerBusy(held) => Err(RunnerRegistryError::RunnerBusy {
            runner_id,
            task_id: *held,
        }),
        AssignOutcome::RunnerStopped => Err(RunnerRegistryError::RunnerStopped(runner_id)),
        AssignOutcome::TaskHeldBy(holder) => {
            debug!(%runner_id, %task_id, %holder, "task held by another runner");
            Ok(ClaimOutcome::Unavailable(task_id))
        }
        AssignOutcome::Assigned(_) => Ok(ClaimOutcome::Unavailable(task_id)),
    }
}

fn is_lost_race(err: &TaskLifecycleError) -> bool {
    err.is_conflict()
        || matches!(
            err,
            TaskLifecycleError::Domain(TaskDomainError::InvalidTransition { .. })
        )
}

fn not_found_as(err: RunnerRepositoryError, runner_id: RunnerId) -> RunnerRegistryError {
    match err {
        RunnerRepositoryError::NotFound(_) => RunnerRegistryError::RunnerNotFound(runner_id),
        other => other.into(),
    }
}
