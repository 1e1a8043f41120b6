//! Fan-out of committed task events to hooks.

use super::HookOrchestrator;
use crate::hook::{
    domain::{HookEvent, HookFailureMode, HookPayload},
    ports::{ExecutableLocator, HookExecutor},
};
use crate::project::ProjectPath;
use crate::task::{
    domain::{CommitSha, SectionRef, TaskEvent, TaskStatus, TaskTransition},
    ports::TaskEventPublisher,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Maps a task status change to its hook event.
#[must_use]
pub const fn event_for_transition(from: TaskStatus, to: TaskStatus) -> HookEvent {
    match (from, to) {
        (TaskStatus::Pending, TaskStatus::InProgress) => HookEvent::TaskStarted,
        (TaskStatus::Review, TaskStatus::InProgress | TaskStatus::Pending) => {
            HookEvent::TaskRejected
        }
        (TaskStatus::InProgress, TaskStatus::Pending) => HookEvent::TaskReleased,
        (_, TaskStatus::Pending) => HookEvent::TaskRestarted,
        (_, TaskStatus::Review) => HookEvent::TaskReview,
        (_, TaskStatus::Completed) => HookEvent::TaskCompleted,
        (_, TaskStatus::Failed) => HookEvent::TaskFailed,
        (_, TaskStatus::Skipped) => HookEvent::TaskSkipped,
        (_, TaskStatus::Partial) => HookEvent::TaskPartial,
        (_, TaskStatus::Disputed) => HookEvent::TaskDisputed,
        (_, TaskStatus::InProgress) => HookEvent::TaskStarted,
    }
}

/// Builds the hook payload for a task event.
#[must_use]
pub fn payload_for(event: &TaskEvent) -> HookPayload {
    match event {
        TaskEvent::Created(task) => HookPayload::new(HookEvent::TaskCreated, task.created_at())
            .with_project(task.project().clone())
            .with_data(json!({
                "task_id": task.id(),
                "title": task.title(),
                "status": task.status().as_str(),
                "section": task.section().map(SectionRef::name),
            })),
        TaskEvent::Transitioned(transition) => transition_payload(transition),
        TaskEvent::ProjectCompleted { project, at } => {
            HookPayload::new(HookEvent::ProjectCompleted, *at).with_project(project.clone())
        }
    }
}

fn transition_payload(transition: &TaskTransition) -> HookPayload {
    let TaskTransition { task, entry } = transition;
    let event = event_for_transition(entry.from_status(), entry.to_status());
    HookPayload::new(event, entry.created_at())
        .with_project(task.project().clone())
        .with_data(json!({
            "task_id": task.id(),
            "title": task.title(),
            "from_status": entry.from_status().as_str(),
            "status": entry.to_status().as_str(),
            "rejection_count": task.rejection_count(),
            "actor": entry.actor(),
            "notes": entry.notes(),
            "commit_sha": entry.commit_sha().map(CommitSha::as_str),
            "time_in_prior_status_ms": entry.time_in_prior_status_ms(),
        }))
}

/// Task event publisher that dispatches hooks.
///
/// Each project may have its own orchestrator (global hooks merged with the
/// project's); other projects fall back to the global one. Dispatch always
/// continues past failing hooks, which are logged.
pub struct HookEventBridge<E, L>
where
    E: HookExecutor,
    L: ExecutableLocator,
{
    global: Arc<HookOrchestrator<E, L>>,
    projects: HashMap<ProjectPath, Arc<HookOrchestrator<E, L>>>,
}

impl<E, L> HookEventBridge<E, L>
where
    E: HookExecutor,
    L: ExecutableLocator,
{
    /// Creates a bridge dispatching through `global`.
    #[must_use]
    pub fn new(global: Arc<HookOrchestrator<E, L>>) -> Self {
        Self {
            global,
            projects: HashMap::new(),
        }
    }

    /// Routes events of `project` through its own orchestrator.
    #[must_use]
    pub fn with_project(
        mut self,
        project: ProjectPath,
        orchestrator: Arc<HookOrchestrator<E, L>>,
    ) -> Self {
        self.projects.insert(project, orchestrator);
        self
    }

    fn orchestrator_for(&self, project: Option<&ProjectPath>) -> &HookOrchestrator<E, L> {
        project
            .and_then(|path| self.projects.get(path))
            .unwrap_or(&self.global)
    }
}

#[async_trait]
impl<E, L> TaskEventPublisher for HookEventBridge<E, L>
where
    E: HookExecutor,
    L: ExecutableLocator,
{
    async fn publish(&self, event: &TaskEvent) {
        let payload = payload_for(event);
        let report = self
            .orchestrator_for(payload.project.as_ref())
            .execute_with_mode(&payload, HookFailureMode::ContinueOnError)
            .await;
        if !report.all_succeeded() {
            warn!(
                event = %report.event,
                failed = report.failures().count(),
                "task event hooks reported failures"
            );
        }
    }
}
