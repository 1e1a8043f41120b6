//! Service layer for the task state machine, audit trail and disputes.

use crate::project::ProjectPath;
use crate::task::{
    adapters::memory::NoopTaskEventPublisher,
    domain::{
        Actor, AuditEntry, CommitSha, Dispute, DisputeKind, NewTask, OpenDisputeParams,
        ParseTaskStatusError, ReviewPolicy, ReviewVerdict, SectionRef, Task, TaskDomainError,
        TaskEvent, TaskId, TaskStatus, TaskTransition, TransitionRecord,
    },
    ports::{DisputeChange, TaskEventPublisher, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a pending task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project: ProjectPath,
    title: String,
    section: Option<SectionRef>,
    source_file: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(project: ProjectPath, title: impl Into<String>) -> Self {
        Self {
            project,
            title: title.into(),
            section: None,
            source_file: None,
        }
    }

    /// Sets the section grouping.
    #[must_use]
    pub fn with_section(mut self, section: SectionRef) -> Self {
        self.section = Some(section);
        self
    }

    /// Sets the plan file the task was extracted from.
    #[must_use]
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }
}

/// Who performed a transition and what they had to say about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionContext {
    actor: Actor,
    notes: Option<String>,
    commit_sha: Option<CommitSha>,
}

impl TransitionContext {
    /// Creates a context for `actor` without notes.
    #[must_use]
    pub const fn new(actor: Actor) -> Self {
        Self {
            actor,
            notes: None,
            commit_sha: None,
        }
    }

    /// Creates a context for a human operator.
    #[must_use]
    pub const fn human() -> Self {
        Self::new(Actor::Human)
    }

    /// Attaches free-text notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attaches the commit produced by the work.
    #[must_use]
    pub fn with_commit_sha(mut self, commit_sha: CommitSha) -> Self {
        self.commit_sha = Some(commit_sha);
        self
    }

    /// Returns the acting identity.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }
}

/// Request payload for a transition addressed by status name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTaskRequest {
    task_id: TaskId,
    target: String,
    context: TransitionContext,
}

impl TransitionTaskRequest {
    /// Creates a request moving `task_id` to the status named `target`,
    /// performed by a human operator.
    #[must_use]
    pub fn new(task_id: TaskId, target: impl Into<String>) -> Self {
        Self {
            task_id,
            target: target.into(),
            context: TransitionContext::human(),
        }
    }

    /// Replaces the transition context.
    #[must_use]
    pub fn with_context(mut self, context: TransitionContext) -> Self {
        self.context = context;
        self
    }
}

/// Request payload for a single reviewer rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRequest {
    task_id: TaskId,
    reviewer: Actor,
    reason: String,
}

impl RejectRequest {
    /// Creates a rejection request.
    #[must_use]
    pub fn new(task_id: TaskId, reviewer: Actor, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            reviewer,
            reason: reason.into(),
        }
    }
}

/// Request payload for restarting a finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    task_id: TaskId,
    guidance: Option<String>,
    actor: Actor,
}

impl RestartRequest {
    /// Creates an operator restart without guidance.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            guidance: None,
            actor: Actor::Human,
        }
    }

    /// Attaches guidance notes; they also resolve an open dispute.
    #[must_use]
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }

    /// Overrides the acting identity.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

/// Result of a reviewer rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionOutcome {
    /// The task went back to the queue or to the coder.
    Returned(Task),
    /// The rejection threshold was reached and a dispute was opened.
    Disputed {
        /// Task in `disputed` status.
        task: Task,
        /// The newly opened dispute.
        dispute: Dispute,
    },
}

impl RejectionOutcome {
    /// Returns the task after the rejection.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Returned(task) | Self::Disputed { task, .. } => task,
        }
    }
}

/// Result of combining several reviewer verdicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Consensus was reached and the task completed.
    Approved(Task),
    /// Consensus failed; counted as one rejection.
    Rejected(RejectionOutcome),
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// A status name could not be parsed.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),
    /// A review was recorded without any verdicts.
    #[error("no reviewer verdicts supplied for task {0}")]
    NoVerdicts(TaskId),
}

impl TaskLifecycleError {
    /// Returns `true` when another writer changed the task first.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Repository(TaskRepositoryError::StatusConflict { .. })
        )
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Every status change goes through [`TaskRepository::commit_transition`],
/// so a transition computed from stale state never lands and never writes an
/// audit entry.
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    publisher: Arc<dyn TaskEventPublisher>,
    review_policy: ReviewPolicy,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            publisher: Arc::clone(&self.publisher),
            review_policy: self.review_policy,
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default review policy and no event
    /// observers.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            publisher: Arc::new(NoopTaskEventPublisher),
            review_policy: ReviewPolicy::default(),
        }
    }

    /// Sets the publisher receiving committed task events.
    #[must_use]
    pub fn with_event_publisher(mut self, publisher: Arc<dyn TaskEventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Overrides the review policy.
    #[must_use]
    pub const fn with_review_policy(mut self, review_policy: ReviewPolicy) -> Self {
        self.review_policy = review_policy;
        self
    }

    /// Returns the active review policy.
    #[must_use]
    pub const fn review_policy(&self) -> ReviewPolicy {
        self.review_policy
    }

    /// Creates and stores a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the title is empty or the
    /// repository rejects persistence.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let task = Task::new(
            NewTask {
                project: request.project,
                title: request.title,
                section: request.section,
                source_file: request.source_file,
            },
            &*self.clock,
        )?;
        self.repository.store(&task).await?;
        info!(task_id = %task.id(), project = %task.project(), "task created");
        self.publisher.publish(&TaskEvent::Created(task.clone())).await;
        Ok(task)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn find_by_id(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Lists a project's tasks in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn list_by_project(&self, project: &ProjectPath) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.list_by_project(project).await?)
    }

    /// Returns the audit trail of a task, oldest entry first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn audit_trail(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<AuditEntry>> {
        Ok(self.repository.audit_trail(task_id).await?)
    }

    /// Returns every dispute opened for a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn disputes(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<Dispute>> {
        Ok(self.repository.list_disputes(task_id).await?)
    }

    /// Applies any edge of the transition table, addressed by status name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::InvalidStatus`] for unknown names,
    /// [`TaskDomainError::InvalidTransition`] for disallowed edges and
    /// [`TaskRepositoryError::StatusConflict`] when the task changed
    /// concurrently.
    pub async fn transition_task(
        &self,
        request: TransitionTaskRequest,
    ) -> TaskLifecycleResult<TaskTransition> {
        let target = TaskStatus::try_from(request.target.as_str())?;
        let task = self.load(request.task_id).await?;
        self.commit(task, target, request.context).await
    }

    /// Claims a pending task: `pending -> in_progress`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn start(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(task_id, &[TaskStatus::Pending], TaskStatus::InProgress, context)
            .await
    }

    /// Returns a claimed task to the queue: `in_progress -> pending`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn release_claim(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(task_id, &[TaskStatus::InProgress], TaskStatus::Pending, context)
            .await
    }

    /// Hands finished work to reviewers: `in_progress -> review`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn submit_for_review(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(task_id, &[TaskStatus::InProgress], TaskStatus::Review, context)
            .await
    }

    /// Approves reviewed work: `review -> completed`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn approve(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(task_id, &[TaskStatus::Review], TaskStatus::Completed, context)
            .await
    }

    /// Marks active work as failed.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn fail(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(
            task_id,
            &[TaskStatus::InProgress, TaskStatus::Review],
            TaskStatus::Failed,
            context,
        )
        .await
    }

    /// Skips a task that is pending or in progress.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn skip(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(
            task_id,
            &[TaskStatus::Pending, TaskStatus::InProgress],
            TaskStatus::Skipped,
            context,
        )
        .await
    }

    /// Records that only part of the work landed.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn mark_partial(
        &self,
        task_id: TaskId,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.apply_from(
            task_id,
            &[TaskStatus::InProgress, TaskStatus::Review],
            TaskStatus::Partial,
            context,
        )
        .await
    }

    /// Records one reviewer rejection.
    ///
    /// The rejection counter is incremented; once it reaches the policy's
    /// dispute threshold the task moves to `disputed` and a dispute is
    /// opened, otherwise it returns to the policy's rejection target.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the task is not
    /// in review, or a repository error when persistence fails.
    pub async fn reject(&self, request: RejectRequest) -> TaskLifecycleResult<RejectionOutcome> {
        let RejectRequest {
            task_id,
            reviewer,
            reason,
        } = request;
        let mut task = self.load(task_id).await?;
        let returned_to = self.review_policy.rejection_target.status();
        if task.status() != TaskStatus::Review {
            return Err(TaskDomainError::InvalidTransition {
                task_id,
                from: task.status(),
                to: returned_to,
            }
            .into());
        }

        let count = task.record_rejection();
        let context = TransitionContext::new(reviewer).with_notes(reason.clone());
        if !self.review_policy.requires_dispute(count) {
            let transition = self.commit(task, returned_to, context).await?;
            debug!(%task_id, rejection_count = count, "task rejected");
            return Ok(RejectionOutcome::Returned(transition.task));
        }

        let dispute = Dispute::open(
            OpenDisputeParams {
                task_id,
                kind: DisputeKind::RepeatedRejection,
                reason: format!("rejected {count} times without resolution"),
                coder_position: None,
                reviewer_position: Some(reason),
            },
            &*self.clock,
        );
        let transition = self
            .commit_with(
                task,
                TaskStatus::Disputed,
                context,
                DisputeChange::Open(dispute.clone()),
            )
            .await?;
        info!(%task_id, dispute_id = %dispute.id(), rejection_count = count, "dispute opened");
        Ok(RejectionOutcome::Disputed {
            task: transition.task,
            dispute,
        })
    }

    /// Combines several reviewer verdicts under the review policy's
    /// consensus rule.
    ///
    /// A reached consensus completes the task. A failed consensus counts as
    /// a single rejection whose notes collect every rejecting reason.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NoVerdicts`] for an empty verdict list,
    /// otherwise the errors of [`Self::approve`] and [`Self::reject`].
    pub async fn record_review(
        &self,
        task_id: TaskId,
        verdicts: &[ReviewVerdict],
    ) -> TaskLifecycleResult<ReviewOutcome> {
        let Some(first) = verdicts.first() else {
            return Err(TaskLifecycleError::NoVerdicts(task_id));
        };

        if self.review_policy.consensus.is_reached(verdicts) {
            let approvers = verdicts
                .iter()
                .map(|verdict| verdict.reviewer().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let context = TransitionContext::new(first.reviewer().clone())
                .with_notes(format!("approved by {approvers}"));
            let transition = self.approve(task_id, context).await?;
            return Ok(ReviewOutcome::Approved(transition.task));
        }

        let rejecting = verdicts
            .iter()
            .filter(|verdict| !verdict.is_approved())
            .collect::<Vec<_>>();
        let reviewer = rejecting
            .first()
            .map_or_else(|| first.reviewer().clone(), |v| v.reviewer().clone());
        let reason = rejecting
            .iter()
            .map(|verdict| {
                format!(
                    "{}: {}",
                    verdict.reviewer(),
                    verdict.reason().unwrap_or("no reason given")
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        let outcome = self
            .reject(RejectRequest::new(task_id, reviewer, reason))
            .await?;
        Ok(ReviewOutcome::Rejected(outcome))
    }

    /// Restarts a finished task back to `pending`.
    ///
    /// Active tasks (`in_progress`, `review`) are refused so that two
    /// workers never act on the same task. The rejection counter resets and
    /// an open dispute is resolved with the guidance notes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task holds a
    /// terminal status.
    pub async fn restart(&self, request: RestartRequest) -> TaskLifecycleResult<TaskTransition> {
        let RestartRequest {
            task_id,
            guidance,
            actor,
        } = request;
        let task = self.load(task_id).await?;
        if !task.status().is_terminal() {
            return Err(TaskDomainError::InvalidTransition {
                task_id,
                from: task.status(),
                to: TaskStatus::Pending,
            }
            .into());
        }

        let mut context = TransitionContext::new(actor);
        if let Some(notes) = guidance.as_deref() {
            context = context.with_notes(notes);
        }
        self.commit(task, TaskStatus::Pending, context).await
    }

    async fn load(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    async fn apply_from(
        &self,
        task_id: TaskId,
        allowed_from: &[TaskStatus],
        target: TaskStatus,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        let task = self.load(task_id).await?;
        if !allowed_from.contains(&task.status()) {
            return Err(TaskDomainError::InvalidTransition {
                task_id,
                from: task.status(),
                to: target,
            }
            .into());
        }
        self.commit(task, target, context).await
    }

    async fn commit(
        &self,
        task: Task,
        target: TaskStatus,
        context: TransitionContext,
    ) -> TaskLifecycleResult<TaskTransition> {
        self.commit_with(task, target, context, DisputeChange::Unchanged)
            .await
    }

    /// Commits a transition together with a dispute write.
    ///
    /// Every terminal to `pending` edge resolves the task's open dispute in
    /// the same unit of work, whichever operation requested it.
    async fn commit_with(
        &self,
        mut task: Task,
        target: TaskStatus,
        context: TransitionContext,
        requested: DisputeChange,
    ) -> TaskLifecycleResult<TaskTransition> {
        let prior_status_since = self
            .repository
            .audit_trail(task.id())
            .await?
            .last()
            .map_or_else(|| task.created_at(), AuditEntry::created_at);
        let from = task.transition_to(target, &*self.clock)?;
        let dispute = if from.is_terminal() && target == TaskStatus::Pending {
            self.resolution_for(task.id(), context.notes.clone()).await?
        } else {
            requested
        };
        let entry = AuditEntry::record(
            TransitionRecord {
                task_id: task.id(),
                actor: context.actor,
                from_status: from,
                to_status: target,
                notes: context.notes,
                commit_sha: context.commit_sha,
                prior_status_since,
            },
            &*self.clock,
        );
        self.repository
            .commit_transition(&task, from, &entry, &dispute)
            .await?;
        if let DisputeChange::Resolve(resolved) = &dispute {
            info!(
                task_id = %task.id(),
                dispute_id = %resolved.id(),
                "dispute resolved on return to pending"
            );
        }
        debug!(
            task_id = %task.id(),
            from = %from,
            to = %target,
            actor = %entry.actor(),
            "task transitioned"
        );

        let transition = TaskTransition { task, entry };
        self.publisher
            .publish(&TaskEvent::Transitioned(transition.clone()))
            .await;
        if target.is_terminal() {
            self.publish_project_completion(&transition).await?;
        }
        Ok(transition)
    }

    async fn resolution_for(
        &self,
        task_id: TaskId,
        guidance: Option<String>,
    ) -> TaskLifecycleResult<DisputeChange> {
        let Some(mut dispute) = self.repository.find_open_dispute(task_id).await? else {
            return Ok(DisputeChange::Unchanged);
        };
        dispute.resolve(guidance, &*self.clock)?;
        Ok(DisputeChange::Resolve(dispute))
    }

    async fn publish_project_completion(
        &self,
        transition: &TaskTransition,
    ) -> TaskLifecycleResult<()> {
        let project = transition.task.project();
        let tasks = self.repository.list_by_project(project).await?;
        if tasks.iter().all(|task| task.status().is_terminal()) {
            info!(project = %project, "all project tasks finished");
            self.publisher
                .publish(&TaskEvent::ProjectCompleted {
                    project: project.clone(),
                    at: transition.entry.created_at(),
                })
                .await;
        }
        Ok(())
    }
}
