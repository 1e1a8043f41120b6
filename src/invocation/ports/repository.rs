//! Repository port for invocation records and payloads.

use crate::invocation::domain::{Invocation, InvocationId, InvocationPayload};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for invocation repository operations.
pub type InvocationRepositoryResult<T> = Result<T, InvocationRepositoryError>;

/// Append-only invocation persistence contract.
#[async_trait]
pub trait InvocationRepository: Send + Sync {
    /// Appends a record together with its optional payload.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationRepositoryError::Duplicate`] when the identifier
    /// already exists.
    async fn append(
        &self,
        invocation: &Invocation,
        payload: Option<&InvocationPayload>,
    ) -> InvocationRepositoryResult<()>;

    /// Returns a task's invocations, oldest first. Payloads are not loaded.
    async fn list_for_task(&self, task_id: TaskId) -> InvocationRepositoryResult<Vec<Invocation>>;

    /// Loads the payload of one invocation.
    async fn payload(
        &self,
        id: InvocationId,
    ) -> InvocationRepositoryResult<Option<InvocationPayload>>;
}

/// Errors returned by invocation repository implementations.
#[derive(Debug, Clone, Error)]
pub enum InvocationRepositoryError {
    /// An invocation with the same identifier already exists.
    #[error("duplicate invocation identifier: {0}")]
    Duplicate(InvocationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl InvocationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
