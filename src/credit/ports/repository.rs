//! Repository port for credit alerts.

use crate::credit::domain::{CreditAlert, CreditAlertId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for credit alert repository operations.
pub type CreditAlertRepositoryResult<T> = Result<T, CreditAlertRepositoryError>;

/// Result of an idempotent raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaiseOutcome {
    /// No alert was active for the triple; the new alert was stored.
    Created(CreditAlert),
    /// An alert for the triple was already active; nothing was stored.
    AlreadyActive(CreditAlert),
}

impl RaiseOutcome {
    /// Returns the active alert for the triple.
    #[must_use]
    pub const fn alert(&self) -> &CreditAlert {
        match self {
            Self::Created(alert) | Self::AlreadyActive(alert) => alert,
        }
    }
}

/// Credit alert persistence contract.
///
/// Implementations guarantee at most one active alert per
/// `(provider, model, role)` triple under concurrent raises.
#[async_trait]
pub trait CreditAlertRepository: Send + Sync {
    /// Stores `alert` unless an alert with the same key is active.
    async fn raise(&self, alert: &CreditAlert) -> CreditAlertRepositoryResult<RaiseOutcome>;

    /// Finds an alert by identifier.
    async fn find_by_id(&self, id: CreditAlertId)
    -> CreditAlertRepositoryResult<Option<CreditAlert>>;

    /// Persists a resolved alert, provided the stored alert is still active.
    ///
    /// # Errors
    ///
    /// Returns [`CreditAlertRepositoryError::NotFound`] for unknown alerts
    /// and [`CreditAlertRepositoryError::NotActive`] when another writer
    /// cleared it first.
    async fn resolve(&self, alert: &CreditAlert) -> CreditAlertRepositoryResult<()>;

    /// Returns every active alert, oldest first.
    async fn list_active(&self) -> CreditAlertRepositoryResult<Vec<CreditAlert>>;
}

/// Errors returned by credit alert repository implementations.
#[derive(Debug, Clone, Error)]
pub enum CreditAlertRepositoryError {
    /// The alert was not found.
    #[error("credit alert not found: {0}")]
    NotFound(CreditAlertId),

    /// The alert was already cleared.
    #[error("credit alert {0} is no longer active")]
    NotActive(CreditAlertId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CreditAlertRepositoryError {
    /// Wraps a data-quality error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
