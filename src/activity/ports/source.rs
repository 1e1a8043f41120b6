//! Source of finished-task history.

use crate::activity::domain::ActivityRecord;
use crate::task::ports::TaskRepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for activity source queries.
pub type ActivitySourceResult<T> = Result<T, ActivitySourceError>;

/// Supplies the tasks that finished inside a window.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Returns one record per task whose terminal transition happened at or
    /// after `since` and whose current status is still that terminal
    /// status. Order is unspecified.
    async fn finished_since(&self, since: DateTime<Utc>)
    -> ActivitySourceResult<Vec<ActivityRecord>>;
}

/// Errors returned by activity sources.
#[derive(Debug, Clone, Error)]
pub enum ActivitySourceError {
    /// Task history could not be read.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}
