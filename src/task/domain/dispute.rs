//! Coder/reviewer disputes.

use super::{DisputeId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Why a dispute was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeKind {
    /// The reviewer rejected the task too many times without resolution.
    RepeatedRejection,
}

impl DisputeKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RepeatedRejection => "repeated_rejection",
        }
    }
}

/// Dispute lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Awaiting a human decision.
    Open,
    /// Resolved by a human restart.
    Resolved,
}

impl DisputeStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

/// Parameter object for opening a dispute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDisputeParams {
    /// Disputed task.
    pub task_id: TaskId,
    /// Dispute kind.
    pub kind: DisputeKind,
    /// Short reason shown to operators.
    pub reason: String,
    /// The coder's position, if it was captured.
    pub coder_position: Option<String>,
    /// The reviewer's position.
    pub reviewer_position: Option<String>,
}

/// Parameter object for reconstructing a persisted dispute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDisputeData {
    /// Persisted dispute identifier.
    pub id: DisputeId,
    /// Persisted task reference.
    pub task_id: TaskId,
    /// Persisted kind.
    pub kind: DisputeKind,
    /// Persisted reason.
    pub reason: String,
    /// Persisted coder position.
    pub coder_position: Option<String>,
    /// Persisted reviewer position.
    pub reviewer_position: Option<String>,
    /// Persisted status.
    pub status: DisputeStatus,
    /// Persisted resolution notes.
    pub resolution_notes: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Unresolved disagreement between coder and reviewer positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    id: DisputeId,
    task_id: TaskId,
    kind: DisputeKind,
    reason: String,
    coder_position: Option<String>,
    reviewer_position: Option<String>,
    status: DisputeStatus,
    resolution_notes: Option<String>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Opens a new dispute.
    #[must_use]
    pub fn open(params: OpenDisputeParams, clock: &impl Clock) -> Self {
        Self {
            id: DisputeId::new(),
            task_id: params.task_id,
            kind: params.kind,
            reason: params.reason,
            coder_position: params.coder_position,
            reviewer_position: params.reviewer_position,
            status: DisputeStatus::Open,
            resolution_notes: None,
            created_at: clock.utc(),
            resolved_at: None,
        }
    }

    /// Reconstructs a dispute from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedDisputeData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            kind: data.kind,
            reason: data.reason,
            coder_position: data.coder_position,
            reviewer_position: data.reviewer_position,
            status: data.status,
            resolution_notes: data.resolution_notes,
            created_at: data.created_at,
            resolved_at: data.resolved_at,
        }
    }

    /// Returns the dispute identifier.
    #[must_use]
    pub const fn id(&self) -> DisputeId {
        self.id
    }

    /// Returns the disputed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the dispute kind.
    #[must_use]
    pub const fn kind(&self) -> DisputeKind {
        self.kind
    }

    /// Returns the reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the coder position, if captured.
    #[must_use]
    pub fn coder_position(&self) -> Option<&str> {
        self.coder_position.as_deref()
    }

    /// Returns the reviewer position, if captured.
    #[must_use]
    pub fn reviewer_position(&self) -> Option<&str> {
        self.reviewer_position.as_deref()
    }

    /// Returns the dispute status.
    #[must_use]
    pub const fn status(&self) -> DisputeStatus {
        self.status
    }

    /// Returns the human guidance recorded on resolution.
    #[must_use]
    pub fn resolution_notes(&self) -> Option<&str> {
        self.resolution_notes.as_deref()
    }

    /// Returns when the dispute was opened.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the dispute was resolved.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Resolves the dispute with optional human guidance.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DisputeAlreadyResolved`] when the dispute
    /// is not open.
    pub fn resolve(
        &mut self,
        guidance: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status == DisputeStatus::Resolved {
            return Err(TaskDomainError::DisputeAlreadyResolved(self.id));
        }
        self.status = DisputeStatus::Resolved;
        self.resolution_notes = guidance;
        self.resolved_at = Some(clock.utc());
        Ok(())
    }
}
