//! Append-only audit trail entries.

use super::{AuditEntryId, CommitSha, TaskId, TaskStatus};
use crate::project::Role;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity responsible for a transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// An AI role invocation.
    Agent {
        /// Role the agent acted in.
        role: Role,
        /// Provider backing the role.
        provider: String,
        /// Model backing the role.
        model: String,
    },
    /// A human operator.
    Human,
    /// An engine component acting on its own, such as a runner claim or an
    /// orphan reclaim.
    System {
        /// Component name.
        component: String,
    },
}

impl Actor {
    /// Creates an agent actor.
    #[must_use]
    pub fn agent(role: Role, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::Agent {
            role,
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Creates a system actor.
    #[must_use]
    pub fn system(component: impl Into<String>) -> Self {
        Self::System {
            component: component.into(),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent {
                role,
                provider,
                model,
            } => write!(f, "{role} ({provider}/{model})"),
            Self::Human => f.write_str("human"),
            Self::System { component } => write!(f, "system:{component}"),
        }
    }
}

/// Parameter object describing one applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Task that transitioned.
    pub task_id: TaskId,
    /// Identity responsible for the transition.
    pub actor: Actor,
    /// Status before the transition.
    pub from_status: TaskStatus,
    /// Status after the transition.
    pub to_status: TaskStatus,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Commit produced by the work, if any.
    pub commit_sha: Option<CommitSha>,
    /// When the prior status was entered.
    pub prior_status_since: DateTime<Utc>,
}

/// Immutable audit entry, written exactly once per status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    task_id: TaskId,
    actor: Actor,
    from_status: TaskStatus,
    to_status: TaskStatus,
    notes: Option<String>,
    commit_sha: Option<CommitSha>,
    time_in_prior_status_ms: u64,
    created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry for a transition applied now.
    ///
    /// The time spent in the prior status is measured from
    /// `record.prior_status_since` and clamps to zero if the clock moved
    /// backwards.
    #[must_use]
    pub fn record(record: TransitionRecord, clock: &impl Clock) -> Self {
        let created_at = clock.utc();
        let elapsed = created_at.signed_duration_since(record.prior_status_since);
        let time_in_prior_status_ms = u64::try_from(elapsed.num_milliseconds()).unwrap_or(0);
        Self {
            id: AuditEntryId::new(),
            task_id: record.task_id,
            actor: record.actor,
            from_status: record.from_status,
            to_status: record.to_status,
            notes: record.notes.filter(|n| !n.trim().is_empty()),
            commit_sha: record.commit_sha,
            time_in_prior_status_ms,
            created_at,
        }
    }

    /// Reconstructs an entry from persisted storage.
    #[expect(
        clippy::too_many_arguments,
        reason = "reconstruction mirrors every persisted column of the audit row"
    )]
    #[must_use]
    pub const fn from_persisted(
        id: AuditEntryId,
        task_id: TaskId,
        actor: Actor,
        from_status: TaskStatus,
        to_status: TaskStatus,
        notes: Option<String>,
        commit_sha: Option<CommitSha>,
        time_in_prior_status_ms: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            actor,
            from_status,
            to_status,
            notes,
            commit_sha,
            time_in_prior_status_ms,
            created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> AuditEntryId {
        self.id
    }

    /// Returns the task this entry belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the actor responsible for the transition.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Returns the status before the transition.
    #[must_use]
    pub const fn from_status(&self) -> TaskStatus {
        self.from_status
    }

    /// Returns the status after the transition.
    #[must_use]
    pub const fn to_status(&self) -> TaskStatus {
        self.to_status
    }

    /// Returns the transition notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the commit SHA, if any.
    #[must_use]
    pub const fn commit_sha(&self) -> Option<&CommitSha> {
        self.commit_sha.as_ref()
    }

    /// Returns the milliseconds spent in the prior status.
    #[must_use]
    pub const fn time_in_prior_status_ms(&self) -> u64 {
        self.time_in_prior_status_ms
    }

    /// Returns when the transition happened.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
