//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::project::ProjectPath;
use crate::task::{
    domain::{AuditEntry, Dispute, DisputeStatus, Task, TaskId, TaskStatus},
    ports::{DisputeChange, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// A single write lock covers tasks, audit entries and disputes, which gives
/// [`TaskRepository::commit_transition`] its compare-and-swap semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    insertion_order: Vec<TaskId>,
    audit: Vec<AuditEntry>,
    disputes: Vec<Dispute>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insertion_order.push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn commit_transition(
        &self,
        task: &Task,
        expected: TaskStatus,
        entry: &AuditEntry,
        dispute: &DisputeChange,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let actual = state
            .tasks
            .get(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?
            .status();
        if actual != expected {
            return Err(TaskRepositoryError::StatusConflict {
                task_id: task.id(),
                expected,
                actual,
            });
        }
        let resolved_slot = match dispute {
            DisputeChange::Unchanged => None,
            DisputeChange::Open(opened) => {
                if state.disputes.iter().any(|d| is_open_for(d, opened.task_id())) {
                    return Err(TaskRepositoryError::DisputeAlreadyOpen(opened.task_id()));
                }
                None
            }
            DisputeChange::Resolve(resolved) => Some(
                state
                    .disputes
                    .iter()
                    .position(|d| d.id() == resolved.id())
                    .ok_or(TaskRepositoryError::DisputeNotFound(resolved.id()))?,
            ),
        };
        state.tasks.insert(task.id(), task.clone());
        state.audit.push(entry.clone());
        match dispute {
            DisputeChange::Unchanged => {}
            DisputeChange::Open(opened) => state.disputes.push(opened.clone()),
            DisputeChange::Resolve(resolved) => {
                if let Some(stored) = resolved_slot.and_then(|i| state.disputes.get_mut(i)) {
                    *stored = resolved.clone();
                }
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_by_project(&self, project: &ProjectPath) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let tasks = state
            .insertion_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| task.project() == project)
            .cloned()
            .collect();
        Ok(tasks)
    }

    async fn audit_trail(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<AuditEntry>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .audit
            .iter()
            .filter(|entry| entry.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn audit_since(&self, since: DateTime<Utc>) -> TaskRepositoryResult<Vec<AuditEntry>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .audit
            .iter()
            .filter(|entry| entry.created_at() >= since)
            .cloned()
            .collect())
    }

    async fn find_open_dispute(&self, task_id: TaskId) -> TaskRepositoryResult<Option<Dispute>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .disputes
            .iter()
            .rev()
            .find(|d| is_open_for(d, task_id))
            .cloned())
    }

    async fn list_disputes(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Dispute>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .disputes
            .iter()
            .filter(|d| d.task_id() == task_id)
            .cloned()
            .collect())
    }
}

fn is_open_for(dispute: &Dispute, task_id: TaskId) -> bool {
    dispute.task_id() == task_id && dispute.status() == DisputeStatus::Open
}
