//! Hook validation and execution errors.

use std::time::Duration;
use thiserror::Error;

/// Error returned while parsing a hook event or kind name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown hook value: {0}")]
pub struct ParseHookValueError(pub String);

/// One structural problem with a hook definition.
///
/// Validation collects every problem of a hook instead of stopping at the
/// first one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookValidationError {
    /// The hook name is blank.
    #[error("hook name must not be empty")]
    EmptyName,

    /// Another hook in the same list already uses this name.
    #[error("duplicate hook name: {0}")]
    DuplicateName(String),

    /// The event is not part of the taxonomy.
    #[error("unknown hook event: {0}")]
    UnknownEvent(String),

    /// The type is neither `script` nor `webhook`.
    #[error("unknown hook type: {0}")]
    UnknownKind(String),

    /// The target is blank.
    #[error("hook target must not be empty")]
    EmptyTarget,

    /// The script's program could not be resolved to an executable.
    #[error("script executable not found: {0}")]
    ExecutableNotFound(String),

    /// The webhook target is not an absolute http(s) URL.
    #[error("invalid webhook URL {url}: {reason}")]
    InvalidUrl {
        /// Offending target.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Failure of a single hook execution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookExecutionError {
    /// The hook definition could not be turned into an executable hook.
    #[error("hook is invalid: {0}")]
    Invalid(String),

    /// The script process could not be started.
    #[error("failed to start script: {0}")]
    Spawn(String),

    /// The script exited unsuccessfully.
    #[error("script exited with status {code:?}: {stderr}")]
    NonZeroExit {
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The hook did not finish in time and was abandoned.
    #[error("hook timed out after {0:?}")]
    TimedOut(Duration),

    /// The webhook request failed before a response arrived.
    #[error("webhook request failed: {0}")]
    Request(String),

    /// The webhook endpoint answered with a non-success status.
    #[error("webhook returned HTTP {0}")]
    Status(u16),
}
