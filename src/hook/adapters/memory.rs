//! In-memory hook adapters for tests and dry embedding.

use crate::hook::{
    domain::{Hook, HookExecutionError, HookPayload},
    ports::{ExecutableLocator, HookExecutor},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One recorded execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExecution {
    /// Hook name.
    pub hook_name: String,
    /// Delivered payload.
    pub payload: HookPayload,
}

/// Executor that records calls instead of running anything.
///
/// Hooks named with [`Self::failing`] report a non-zero exit.
#[derive(Debug, Clone, Default)]
pub struct RecordingHookExecutor {
    executions: Arc<Mutex<Vec<RecordedExecution>>>,
    failing: HashSet<String>,
}

impl RecordingHookExecutor {
    /// Creates an executor where every hook succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the named hook fail.
    #[must_use]
    pub fn failing(mut self, hook_name: impl Into<String>) -> Self {
        self.failing.insert(hook_name.into());
        self
    }

    /// Returns every execution so far, oldest first.
    #[must_use]
    pub fn executions(&self) -> Vec<RecordedExecution> {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the names of executed hooks, oldest first.
    #[must_use]
    pub fn executed_names(&self) -> Vec<String> {
        self.executions()
            .into_iter()
            .map(|execution| execution.hook_name)
            .collect()
    }
}

#[async_trait]
impl HookExecutor for RecordingHookExecutor {
    async fn execute(
        &self,
        hook: &Hook,
        payload: &HookPayload,
        _timeout: Duration,
    ) -> Result<(), HookExecutionError> {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedExecution {
                hook_name: hook.name().to_owned(),
                payload: payload.clone(),
            });
        if self.failing.contains(hook.name()) {
            return Err(HookExecutionError::NonZeroExit {
                code: Some(1),
                stderr: format!("{} failed", hook.name()),
            });
        }
        Ok(())
    }
}

/// Locator that only knows a fixed set of programs.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    known: HashSet<String>,
}

impl StaticLocator {
    /// Creates a locator resolving exactly `programs`.
    #[must_use]
    pub fn new(programs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            known: programs.into_iter().map(Into::into).collect(),
        }
    }
}

impl ExecutableLocator for StaticLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.known.contains(program).then(|| PathBuf::from(program))
    }
}
