//! Task status state machine.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting to be claimed by a runner.
    Pending,
    /// A coder is implementing the task.
    InProgress,
    /// The implementation is awaiting reviewer verdicts.
    Review,
    /// Reviewers approved the task.
    Completed,
    /// The task was deliberately not worked on.
    Skipped,
    /// The task could not be completed.
    Failed,
    /// Coder and reviewer could not agree after repeated rejections.
    Disputed,
    /// Part of the work landed; the rest was split off.
    Partial,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::InProgress,
        Self::Review,
        Self::Completed,
        Self::Skipped,
        Self::Failed,
        Self::Disputed,
        Self::Partial,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Disputed => "disputed",
            Self::Partial => "partial",
        }
    }

    /// Returns `true` for statuses that end a run of work.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Skipped | Self::Failed | Self::Disputed | Self::Partial
        )
    }

    /// Returns `true` while a runner or reviewer is actively working the task.
    ///
    /// Restarting an active task would cause concurrent double-work.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Review)
    }

    /// Returns `true` when the edge `self -> target` is in the transition
    /// table.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Pending => matches!(target, Self::InProgress | Self::Skipped),
            Self::InProgress => matches!(
                target,
                Self::Review | Self::Failed | Self::Skipped | Self::Partial | Self::Pending
            ),
            Self::Review => matches!(
                target,
                Self::Completed
                    | Self::Failed
                    | Self::Disputed
                    | Self::Partial
                    | Self::Pending
                    | Self::InProgress
            ),
            Self::Completed | Self::Skipped | Self::Failed | Self::Disputed | Self::Partial => {
                matches!(target, Self::Pending)
            }
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            "failed" => Ok(Self::Failed),
            "disputed" => Ok(Self::Disputed),
            "partial" => Ok(Self::Partial),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}
