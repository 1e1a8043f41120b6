//! Credit alert lifecycle and role blocking.

use crate::credit::{
    domain::{AlertKey, AlertResolution, CreditAlert, CreditAlertId, CreditDomainError, RetrySignal},
    ports::{CreditAlertRepository, CreditAlertRepositoryError, RaiseOutcome},
};
use crate::invocation::ports::{CreditExhaustionNotice, CreditExhaustionSink};
use crate::project::{ProjectPath, ProjectRoster, Role};
use crate::runner::ports::{WorkGate, WorkGateError, WorkGateResult};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const RETRY_CHANNEL_CAPACITY: usize = 16;

/// Service-level errors for credit alert operations.
#[derive(Debug, Error)]
pub enum CreditAlertError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] CreditDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] CreditAlertRepositoryError),
    /// The alert does not exist.
    #[error("credit alert not found: {0}")]
    NotFound(CreditAlertId),
}

/// Result type for credit alert service operations.
pub type CreditAlertResult<T> = Result<T, CreditAlertError>;

/// Raises, clears and reports credit-exhaustion alerts.
///
/// Project rosters registered with the service decide which alerts concern
/// a project and which of its roles are blocked. Projects without a roster
/// are never blocked.
pub struct CreditAlertService<R, C>
where
    R: CreditAlertRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    rosters: Arc<RwLock<HashMap<ProjectPath, ProjectRoster>>>,
    retries: broadcast::Sender<RetrySignal>,
}

impl<R, C> Clone for CreditAlertService<R, C>
where
    R: CreditAlertRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            rosters: Arc::clone(&self.rosters),
            retries: self.retries.clone(),
        }
    }
}

impl<R, C> CreditAlertService<R, C>
where
    R: CreditAlertRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new alert service.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        let (retries, _) = broadcast::channel(RETRY_CHANNEL_CAPACITY);
        Self {
            repository,
            clock,
            rosters: Arc::new(RwLock::new(HashMap::new())),
            retries,
        }
    }

    /// Registers or replaces a project's roster.
    pub fn register_roster(&self, roster: ProjectRoster) {
        let mut rosters = self.rosters.write().unwrap_or_else(PoisonError::into_inner);
        rosters.insert(roster.project().clone(), roster);
    }

    /// Raises an alert for the triple, or returns the one already active.
    ///
    /// # Errors
    ///
    /// Returns [`CreditAlertError`] when the triple is invalid or storage
    /// fails.
    pub async fn raise(
        &self,
        provider: &str,
        model: &str,
        role: Role,
        message: &str,
    ) -> CreditAlertResult<RaiseOutcome> {
        let key = AlertKey::new(provider, model, role)?;
        let alert = CreditAlert::raise(key, message, &*self.clock);
        let outcome = self.repository.raise(&alert).await?;
        match &outcome {
            RaiseOutcome::Created(created) => {
                warn!(alert_id = %created.id(), key = %created.key(), "credit alert raised");
            }
            RaiseOutcome::AlreadyActive(active) => {
                debug!(alert_id = %active.id(), key = %active.key(), "credit alert already active");
            }
        }
        Ok(outcome)
    }

    /// Clears an alert without asking runners to retry.
    ///
    /// # Errors
    ///
    /// Returns [`CreditAlertError::NotFound`] for unknown alerts and
    /// [`CreditAlertError::Domain`] when the alert was already cleared.
    pub async fn dismiss(&self, alert_id: CreditAlertId) -> CreditAlertResult<CreditAlert> {
        self.resolve(alert_id, AlertResolution::Dismissed).await
    }

    /// Clears an alert and signals runners to re-attempt the paused work.
    ///
    /// # Errors
    ///
    /// See [`Self::dismiss`].
    pub async fn retry(&self, alert_id: CreditAlertId) -> CreditAlertResult<CreditAlert> {
        let alert = self.resolve(alert_id, AlertResolution::Retried).await?;
        let signal = RetrySignal {
            alert_id,
            key: alert.key().clone(),
        };
        if let Err(err) = self.retries.send(signal) {
            debug!(%alert_id, error = %err, "no runner is listening for retries");
        }
        Ok(alert)
    }

    /// Subscribes to retry signals.
    #[must_use]
    pub fn subscribe_retries(&self) -> broadcast::Receiver<RetrySignal> {
        self.retries.subscribe()
    }

    /// Lists active alerts, optionally only those affecting `project`.
    ///
    /// # Errors
    ///
    /// Returns [`CreditAlertError::Repository`] when listing fails.
    pub async fn list_active(
        &self,
        project: Option<&ProjectPath>,
    ) -> CreditAlertResult<Vec<CreditAlert>> {
        let active = self.repository.list_active().await?;
        let Some(path) = project else {
            return Ok(active);
        };
        let rosters = self.rosters.read().unwrap_or_else(PoisonError::into_inner);
        let Some(roster) = rosters.get(path) else {
            return Ok(Vec::new());
        };
        Ok(active
            .into_iter()
            .filter(|alert| affects(roster, alert.key()))
            .collect())
    }

    /// Returns the roles of `project` blocked by active alerts, in pipeline
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CreditAlertError::Repository`] when listing fails.
    pub async fn blocked_roles(&self, project: &ProjectPath) -> CreditAlertResult<Vec<Role>> {
        let affecting = self.list_active(Some(project)).await?;
        Ok(Role::ALL
            .into_iter()
            .filter(|role| affecting.iter().any(|alert| alert.key().role() == *role))
            .collect())
    }

    async fn resolve(
        &self,
        alert_id: CreditAlertId,
        resolution: AlertResolution,
    ) -> CreditAlertResult<CreditAlert> {
        let mut alert = self
            .repository
            .find_by_id(alert_id)
            .await?
            .ok_or(CreditAlertError::NotFound(alert_id))?;
        alert.resolve(resolution, &*self.clock)?;
        self.repository
            .resolve(&alert)
            .await
            .map_err(|err| match err {
                CreditAlertRepositoryError::NotFound(id) => CreditAlertError::NotFound(id),
                CreditAlertRepositoryError::NotActive(id) => CreditDomainError::NotActive(id).into(),
                other => other.into(),
            })?;
        info!(%alert_id, resolution = resolution.as_str(), key = %alert.key(), "credit alert cleared");
        Ok(alert)
    }
}

fn affects(roster: &ProjectRoster, key: &AlertKey) -> bool {
    roster.uses(key.provider(), key.model(), key.role())
}

#[async_trait]
impl<R, C> WorkGate for CreditAlertService<R, C>
where
    R: CreditAlertRepository,
    C: Clock + Send + Sync,
{
    async fn blocked_roles(&self, project: &ProjectPath) -> WorkGateResult<Vec<Role>> {
        Self::blocked_roles(self, project)
            .await
            .map_err(WorkGateError::new)
    }
}

#[async_trait]
impl<R, C> CreditExhaustionSink for CreditAlertService<R, C>
where
    R: CreditAlertRepository,
    C: Clock + Send + Sync,
{
    async fn credit_exhausted(&self, notice: &CreditExhaustionNotice) {
        if let Err(err) = self
            .raise(&notice.provider, &notice.model, notice.role, &notice.message)
            .await
        {
            warn!(
                invocation_id = %notice.invocation_id,
                task_id = %notice.task_id,
                error = %err,
                "failed to raise credit alert"
            );
        }
    }
}
