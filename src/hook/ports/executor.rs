//! Hook execution port.

use crate::hook::domain::{Hook, HookExecutionError, HookPayload};
use async_trait::async_trait;
use std::time::Duration;

/// Runs one validated hook.
///
/// Implementations must give up once `timeout` elapses and report
/// [`HookExecutionError::TimedOut`]; a hung hook must not hold up its
/// siblings.
#[async_trait]
pub trait HookExecutor: Send + Sync {
    /// Executes `hook` with `payload`.
    async fn execute(
        &self,
        hook: &Hook,
        payload: &HookPayload,
        timeout: Duration,
    ) -> Result<(), HookExecutionError>;
}
