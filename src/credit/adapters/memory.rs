//! In-memory credit alert repository.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::credit::{
    domain::{CreditAlert, CreditAlertId},
    ports::{
        CreditAlertRepository, CreditAlertRepositoryError, CreditAlertRepositoryResult,
        RaiseOutcome,
    },
};

/// Thread-safe in-memory credit alert repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCreditAlertRepository {
    alerts: Arc<RwLock<Vec<CreditAlert>>>,
}

impl InMemoryCreditAlertRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> CreditAlertRepositoryError {
    CreditAlertRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl CreditAlertRepository for InMemoryCreditAlertRepository {
    async fn raise(&self, alert: &CreditAlert) -> CreditAlertRepositoryResult<RaiseOutcome> {
        let mut alerts = self.alerts.write().map_err(lock_error)?;
        if let Some(active) = alerts
            .iter()
            .find(|stored| stored.is_active() && stored.key() == alert.key())
        {
            return Ok(RaiseOutcome::AlreadyActive(active.clone()));
        }
        alerts.push(alert.clone());
        Ok(RaiseOutcome::Created(alert.clone()))
    }

    async fn find_by_id(
        &self,
        id: CreditAlertId,
    ) -> CreditAlertRepositoryResult<Option<CreditAlert>> {
        let alerts = self.alerts.read().map_err(lock_error)?;
        Ok(alerts.iter().find(|stored| stored.id() == id).cloned())
    }

    async fn resolve(&self, alert: &CreditAlert) -> CreditAlertRepositoryResult<()> {
        let mut alerts = self.alerts.write().map_err(lock_error)?;
        let slot = alerts
            .iter_mut()
            .find(|stored| stored.id() == alert.id())
            .ok_or(CreditAlertRepositoryError::NotFound(alert.id()))?;
        if !slot.is_active() {
            return Err(CreditAlertRepositoryError::NotActive(alert.id()));
        }
        *slot = alert.clone();
        Ok(())
    }

    async fn list_active(&self) -> CreditAlertRepositoryResult<Vec<CreditAlert>> {
        let alerts = self.alerts.read().map_err(lock_error)?;
        Ok(alerts.iter().filter(|a| a.is_active()).cloned().collect())
    }
}
