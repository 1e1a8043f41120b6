//! Activity source backed by the task audit trail.

use crate::activity::{
    domain::ActivityRecord,
    ports::{ActivitySource, ActivitySourceResult},
};
use crate::task::{
    domain::{AuditEntry, TaskId},
    ports::TaskRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Derives finished tasks from [`TaskRepository::audit_since`].
///
/// Per task only the latest terminal entry inside the window is kept, and
/// only while the task still holds that status: a task completed and then
/// restarted does not count.
#[derive(Debug, Clone)]
pub struct TaskHistorySource<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> TaskHistorySource<R> {
    /// Creates a source reading from `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: TaskRepository> ActivitySource for TaskHistorySource<R> {
    async fn finished_since(
        &self,
        since: DateTime<Utc>,
    ) -> ActivitySourceResult<Vec<ActivityRecord>> {
        let entries = self.repository.audit_since(since).await?;
        let mut latest: HashMap<TaskId, AuditEntry> = HashMap::new();
        for entry in entries
            .into_iter()
            .filter(|entry| entry.to_status().is_terminal())
        {
            latest.insert(entry.task_id(), entry);
        }

        let mut records = Vec::with_capacity(latest.len());
        for (task_id, entry) in latest {
            let Some(task) = self.repository.find_by_id(task_id).await? else {
                continue;
            };
            if task.status() != entry.to_status() {
                continue;
            }
            records.push(ActivityRecord {
                task_id,
                project: task.project().clone(),
                title: task.title().to_owned(),
                status: entry.to_status(),
                finished_at: entry.created_at(),
                actor: entry.actor().clone(),
            });
        }
        Ok(records)
    }
}
