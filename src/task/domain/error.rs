//! Error types for task domain validation and parsing.

use super::{DisputeId, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The section name is empty after trimming.
    #[error("section name must not be empty")]
    EmptySectionName,

    /// The commit SHA is not 7 to 40 hexadecimal characters.
    #[error("invalid commit SHA '{0}', expected 7 to 40 hex characters")]
    InvalidCommitSha(String),

    /// The requested status edge is not part of the transition table.
    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current task status.
        from: TaskStatus,
        /// Requested target status.
        to: TaskStatus,
    },

    /// The dispute has already been resolved.
    #[error("dispute {0} is already resolved")]
    DisputeAlreadyResolved(DisputeId),
}

/// Error returned while parsing task statuses from persistence or callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
