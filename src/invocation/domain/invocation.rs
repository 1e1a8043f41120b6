//! Immutable invocation records.

use super::{FailureClass, InvocationDomainError, classify};
use crate::project::Role;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an invocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Creates a new random invocation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result reported by the invocation executor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvocationOutcome {
    /// Whether the invocation produced a usable response.
    pub success: bool,
    /// Whether the executor gave up waiting.
    pub timed_out: bool,
    /// Process exit code or HTTP status, when one exists.
    pub exit_code: Option<i32>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Error text reported by the provider or tool.
    pub error: Option<String>,
}

impl InvocationOutcome {
    /// A successful outcome.
    #[must_use]
    pub const fn succeeded(duration_ms: u64) -> Self {
        Self {
            success: true,
            timed_out: false,
            exit_code: Some(0),
            duration_ms,
            error: None,
        }
    }

    /// A failed outcome carrying the provider's error text.
    #[must_use]
    pub fn failed(exit_code: Option<i32>, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            timed_out: false,
            exit_code,
            duration_ms,
            error: Some(error.into()),
        }
    }

    /// An outcome where the executor timed out.
    #[must_use]
    pub const fn timed_out(duration_ms: u64) -> Self {
        Self {
            success: false,
            timed_out: true,
            exit_code: None,
            duration_ms,
            error: None,
        }
    }
}

/// Prompt and response text, kept apart from the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationPayload {
    /// Prompt sent to the provider.
    pub prompt: String,
    /// Response text, when the provider produced one.
    pub response: Option<String>,
}

/// Parameter object for recording an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvocation {
    /// Task the invocation worked on.
    pub task_id: TaskId,
    /// Role that was invoked.
    pub role: Role,
    /// Provider name.
    pub provider: String,
    /// Model name.
    pub model: String,
    /// Executor result.
    pub outcome: InvocationOutcome,
    /// Coder attempt ordinal; zero for the first attempt.
    pub rejection_number: u32,
}

/// Immutable record of one AI-role invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    id: InvocationId,
    task_id: TaskId,
    role: Role,
    provider: String,
    model: String,
    outcome: InvocationOutcome,
    rejection_number: u32,
    failure_class: FailureClass,
    created_at: DateTime<Utc>,
}

impl Invocation {
    /// Creates and classifies a record.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationDomainError`] when provider or model is blank.
    pub fn new(params: NewInvocation, clock: &impl Clock) -> Result<Self, InvocationDomainError> {
        let provider = params.provider.trim().to_owned();
        if provider.is_empty() {
            return Err(InvocationDomainError::EmptyProvider);
        }
        let model = params.model.trim().to_owned();
        if model.is_empty() {
            return Err(InvocationDomainError::EmptyModel);
        }
        let failure_class = classify(&provider, &params.outcome);
        Ok(Self {
            id: InvocationId::new(),
            task_id: params.task_id,
            role: params.role,
            provider,
            model,
            outcome: params.outcome,
            rejection_number: params.rejection_number,
            failure_class,
            created_at: clock.utc(),
        })
    }

    /// Returns the invocation identifier.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the invoked role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the executor outcome.
    #[must_use]
    pub const fn outcome(&self) -> &InvocationOutcome {
        &self.outcome
    }

    /// Returns the coder attempt ordinal.
    #[must_use]
    pub const fn rejection_number(&self) -> u32 {
        self.rejection_number
    }

    /// Returns the classification computed on write.
    #[must_use]
    pub const fn failure_class(&self) -> FailureClass {
        self.failure_class
    }

    /// Returns when the invocation was recorded.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
