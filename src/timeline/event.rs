//! Timeline event kinds and their wire framing.

use crate::project::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sub-event of an invocation, or a stream lifecycle signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimelineEvent {
    /// The invocation began.
    #[serde(rename = "invocation.started")]
    InvocationStarted {
        /// Invoked role.
        role: Role,
        /// Provider serving the role.
        provider: String,
        /// Model serving the role.
        model: String,
    },
    /// The agent ran a tool.
    #[serde(rename = "tool")]
    Tool {
        /// Command line or tool name.
        cmd: String,
    },
    /// A chunk of agent output.
    #[serde(rename = "output")]
    Output {
        /// Output text.
        msg: String,
    },
    /// The invocation finished.
    #[serde(rename = "invocation.completed")]
    InvocationCompleted {
        /// Whether the invocation succeeded.
        success: bool,
        /// Wall-clock duration.
        duration_ms: u64,
    },
    /// The invocation aborted.
    #[serde(rename = "error")]
    Error {
        /// Failure description.
        message: String,
    },
    /// Nothing is running for the task.
    #[serde(rename = "no_active_invocation")]
    NoActiveInvocation,
    /// An invocation is running but has produced no output yet.
    #[serde(rename = "waiting_for_log")]
    WaitingForLog,
    /// The invocation's output can no longer be found.
    #[serde(rename = "log_not_found")]
    LogNotFound,
}

impl TimelineEvent {
    /// Returns `true` for events after which the stream closes.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::InvocationCompleted { .. }
                | Self::Error { .. }
                | Self::LogNotFound
                | Self::NoActiveInvocation
        )
    }

    /// Returns `true` for events carrying invocation output.
    #[must_use]
    pub const fn is_output(&self) -> bool {
        matches!(self, Self::Tool { .. } | Self::Output { .. })
    }
}

/// A timeline event as delivered to observers.
///
/// `sequence` increases by one per event of an invocation, starting at 1.
/// Lifecycle signals synthesised for a single observer carry sequence 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineFrame {
    /// Position within the invocation.
    pub sequence: u64,
    /// Emission time.
    pub emitted_at: DateTime<Utc>,
    /// The event.
    #[serde(flatten)]
    pub event: TimelineEvent,
}

impl TimelineFrame {
    /// Renders the frame as one newline-terminated JSON object.
    ///
    /// # Errors
    ///
    /// Returns a serialisation error if the frame cannot be encoded.
    pub fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
