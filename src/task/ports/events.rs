//! Publisher port for task lifecycle events.

use crate::task::domain::TaskEvent;
use async_trait::async_trait;

/// Receives task events after they have been committed.
///
/// Publishing is fire-and-forget from the lifecycle service's point of view:
/// implementations record their own failures instead of returning them, so
/// a broken observer can never undo or block a committed transition.
#[async_trait]
pub trait TaskEventPublisher: Send + Sync {
    /// Handles one committed task event.
    async fn publish(&self, event: &TaskEvent);
}
