//! Credit alert aggregate.

use super::{CreditDomainError, ParseAlertValueError};
use crate::project::Role;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a credit alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditAlertId(Uuid);

impl CreditAlertId {
    /// Creates a new random identifier.
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

impl Default for CreditAlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CreditAlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `(provider, model, role)` triple an alert is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    provider: String,
    model: String,
    role: Role,
}

impl AlertKey {
    /// Creates a validated key.
    ///
    /// # Errors
    ///
    /// Returns [`CreditDomainError`] when provider or model is blank.
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        role: Role,
    ) -> Result<Self, CreditDomainError> {
        let provider_name = provider.into().trim().to_owned();
        if provider_name.is_empty() {
            return Err(CreditDomainError::EmptyProvider);
        }
        let model_name = model.into().trim().to_owned();
        if model_name.is_empty() {
            return Err(CreditDomainError::EmptyModel);
        }
        Ok(Self {
            provider: provider_name,
            model: model_name,
            role,
        })
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

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.provider, self.model, self.role)
    }
}

/// Alert lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// The condition persists; affected roles are paused.
    Active,
    /// The alert was cleared by a dismissal or a retry.
    Dismissed,
}

impl AlertStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Dismissed => "dismissed",
        }
    }
}

impl TryFrom<&str> for AlertStatus {
    type Error = ParseAlertValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "dismissed" => Ok(Self::Dismissed),
            _ => Err(ParseAlertValueError(value.to_owned())),
        }
    }
}

/// How an alert was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertResolution {
    /// An operator acknowledged the warning.
    Dismissed,
    /// An operator asked runners to re-attempt the paused invocation.
    Retried,
}

impl AlertResolution {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dismissed => "dismissed",
            Self::Retried => "retried",
        }
    }
}

impl TryFrom<&str> for AlertResolution {
    type Error = ParseAlertValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "dismissed" => Ok(Self::Dismissed),
            "retried" => Ok(Self::Retried),
            _ => Err(ParseAlertValueError(value.to_owned())),
        }
    }
}

/// Alert raised when a provider account runs dry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAlert {
    id: CreditAlertId,
    key: AlertKey,
    message: String,
    status: AlertStatus,
    resolution: Option<AlertResolution>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl CreditAlert {
    /// Creates an active alert.
    #[must_use]
    pub fn raise(key: AlertKey, message: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: CreditAlertId::new(),
            key,
            message: message.into(),
            status: AlertStatus::Active,
            resolution: None,
            created_at: clock.utc(),
            resolved_at: None,
        }
    }

    /// Reconstructs an alert from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: CreditAlertId,
        key: AlertKey,
        message: String,
        status: AlertStatus,
        resolution: Option<AlertResolution>,
        timestamps: (DateTime<Utc>, Option<DateTime<Utc>>),
    ) -> Self {
        Self {
            id,
            key,
            message,
            status,
            resolution,
            created_at: timestamps.0,
            resolved_at: timestamps.1,
        }
    }

    /// Clears the alert.
    ///
    /// # Errors
    ///
    /// Returns [`CreditDomainError::NotActive`] when the alert was already
    /// cleared.
    pub fn resolve(
        &mut self,
        resolution: AlertResolution,
        clock: &impl Clock,
    ) -> Result<(), CreditDomainError> {
        if self.status != AlertStatus::Active {
            return Err(CreditDomainError::NotActive(self.id));
        }
        self.status = AlertStatus::Dismissed;
        self.resolution = Some(resolution);
        self.resolved_at = Some(clock.utc());
        Ok(())
    }

    /// Returns the alert identifier.
    #[must_use]
    pub const fn id(&self) -> CreditAlertId {
        self.id
    }

    /// Returns the alert key.
    #[must_use]
    pub const fn key(&self) -> &AlertKey {
        &self.key
    }

    /// Returns the provider error text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AlertStatus {
        self.status
    }

    /// Returns `true` while the alert pauses work.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, AlertStatus::Active)
    }

    /// Returns how the alert was cleared.
    #[must_use]
    pub const fn resolution(&self) -> Option<AlertResolution> {
        self.resolution
    }

    /// Returns when the alert was raised.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the alert was cleared.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }
}

/// Broadcast to runners when an operator retries an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySignal {
    /// The retried alert.
    pub alert_id: CreditAlertId,
    /// The triple runners should re-attempt.
    pub key: AlertKey,
}
