//! Dispatch settings and the records hooks leave behind.

use super::{HookConfig, HookEvent, HookExecutionError, HookValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How dispatch reacts to a failing hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailureMode {
    /// Record the failure and run the remaining hooks.
    #[default]
    ContinueOnError,
    /// Stop at the first failure.
    FailFast,
}

/// Hook dispatch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSettings {
    /// Per-hook execution limit in seconds.
    pub timeout_secs: u64,
    /// Reaction to failures.
    pub failure_mode: HookFailureMode,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            failure_mode: HookFailureMode::ContinueOnError,
        }
    }
}

impl HookSettings {
    /// Fail-fast settings, for interactive test runs.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            timeout_secs: 30,
            failure_mode: HookFailureMode::FailFast,
        }
    }

    /// Returns the per-hook timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Validation verdict for one merged hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookValidation {
    /// The checked definition.
    pub hook: HookConfig,
    /// `true` when `errors` is empty.
    pub valid: bool,
    /// Every problem found.
    pub errors: Vec<HookValidationError>,
}

/// Outcome of one hook execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookExecutionResult {
    /// Hook name.
    pub hook_name: String,
    /// `true` when the hook ran to a successful end.
    pub success: bool,
    /// Failure detail.
    pub error: Option<HookExecutionError>,
    /// Wall-clock time spent.
    pub duration: Duration,
}

impl HookExecutionResult {
    /// Builds a result from an execution outcome.
    #[must_use]
    pub fn from_outcome(
        hook_name: impl Into<String>,
        outcome: Result<(), HookExecutionError>,
        duration: Duration,
    ) -> Self {
        Self {
            hook_name: hook_name.into(),
            success: outcome.is_ok(),
            error: outcome.err(),
            duration,
        }
    }
}

/// Everything that happened while dispatching one event.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDispatchReport {
    /// Dispatched event.
    pub event: HookEvent,
    /// One entry per executed hook, in merged order.
    pub results: Vec<HookExecutionResult>,
    /// `true` when fail-fast mode stopped dispatch early.
    pub aborted: bool,
}

impl HookDispatchReport {
    /// Returns the failed executions.
    pub fn failures(&self) -> impl Iterator<Item = &HookExecutionResult> {
        self.results.iter().filter(|result| !result.success)
    }

    /// Returns `true` when every executed hook succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|result| result.success)
    }
}
