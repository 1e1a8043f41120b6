//! Gate deciding whether a project's runners may claim new work.

use crate::project::{ProjectPath, Role};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for work gate queries.
pub type WorkGateResult<T> = Result<T, WorkGateError>;

/// Reports roles that are currently unable to work for a project.
#[async_trait]
pub trait WorkGate: Send + Sync {
    /// Returns the blocked roles of `project`, or an empty list.
    async fn blocked_roles(&self, project: &ProjectPath) -> WorkGateResult<Vec<Role>>;
}

/// Error returned when the gate cannot be consulted.
#[derive(Debug, Clone, Error)]
#[error("work gate unavailable: {0}")]
pub struct WorkGateError(pub Arc<dyn std::error::Error + Send + Sync>);

impl WorkGateError {
    /// Wraps an underlying failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
