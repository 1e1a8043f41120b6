//! In-memory invocation repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::invocation::{
    domain::{Invocation, InvocationId, InvocationPayload},
    ports::{InvocationRepository, InvocationRepositoryError, InvocationRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory invocation repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvocationRepository {
    state: Arc<RwLock<InMemoryInvocationState>>,
}

#[derive(Debug, Default)]
struct InMemoryInvocationState {
    records: Vec<Invocation>,
    payloads: HashMap<InvocationId, InvocationPayload>,
}

impl InMemoryInvocationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> InvocationRepositoryError {
    InvocationRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl InvocationRepository for InMemoryInvocationRepository {
    async fn append(
        &self,
        invocation: &Invocation,
        payload: Option<&InvocationPayload>,
    ) -> InvocationRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.records.iter().any(|r| r.id() == invocation.id()) {
            return Err(InvocationRepositoryError::Duplicate(invocation.id()));
        }
        state.records.push(invocation.clone());
        if let Some(body) = payload {
            state.payloads.insert(invocation.id(), body.clone());
        }
        Ok(())
    }

    async fn list_for_task(&self, task_id: TaskId) -> InvocationRepositoryResult<Vec<Invocation>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn payload(
        &self,
        id: InvocationId,
    ) -> InvocationRepositoryResult<Option<InvocationPayload>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.payloads.get(&id).cloned())
    }
}
