//! `PostgreSQL` repository implementation for credit alerts.

use super::{models::CreditAlertRow, schema::credit_alerts};
use crate::credit::{
    domain::{AlertKey, AlertResolution, AlertStatus, CreditAlert, CreditAlertId},
    ports::{
        CreditAlertRepository, CreditAlertRepositoryError, CreditAlertRepositoryResult,
        RaiseOutcome,
    },
};
use crate::project::Role;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by the credit adapter.
pub type CreditPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed credit alert repository.
///
/// Raises use `INSERT ... ON CONFLICT DO NOTHING` against the partial unique
/// index on active alerts, so concurrent raises for one triple store a
/// single row.
#[derive(Debug, Clone)]
pub struct PostgresCreditAlertRepository {
    pool: CreditPgPool,
}

impl PostgresCreditAlertRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: CreditPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> CreditAlertRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CreditAlertRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(CreditAlertRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(CreditAlertRepositoryError::persistence)?
    }
}

#[async_trait]
impl CreditAlertRepository for PostgresCreditAlertRepository {
    async fn raise(&self, alert: &CreditAlert) -> CreditAlertRepositoryResult<RaiseOutcome> {
        let row = to_row(alert);
        let created = alert.clone();
        self.run_blocking(move |connection| {
            let inserted = diesel::insert_into(credit_alerts::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(connection)
                .map_err(CreditAlertRepositoryError::persistence)?;
            if inserted == 1 {
                return Ok(RaiseOutcome::Created(created));
            }
            let active = credit_alerts::table
                .filter(credit_alerts::provider.eq(&row.provider))
                .filter(credit_alerts::model.eq(&row.model))
                .filter(credit_alerts::role.eq(&row.role))
                .filter(credit_alerts::status.eq(AlertStatus::Active.as_str()))
                .select(CreditAlertRow::as_select())
                .first::<CreditAlertRow>(connection)
                .map_err(CreditAlertRepositoryError::persistence)?;
            Ok(RaiseOutcome::AlreadyActive(row_to_alert(active)?))
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: CreditAlertId,
    ) -> CreditAlertRepositoryResult<Option<CreditAlert>> {
        self.run_blocking(move |connection| {
            let row = credit_alerts::table
                .find(id.into_inner())
                .select(CreditAlertRow::as_select())
                .first::<CreditAlertRow>(connection)
                .optional()
                .map_err(CreditAlertRepositoryError::persistence)?;
            row.map(row_to_alert).transpose()
        })
        .await
    }

    async fn resolve(&self, alert: &CreditAlert) -> CreditAlertRepositoryResult<()> {
        let alert_id = alert.id();
        let row = to_row(alert);
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                credit_alerts::table
                    .find(row.id)
                    .filter(credit_alerts::status.eq(AlertStatus::Active.as_str())),
            )
            .set((
                credit_alerts::status.eq(&row.status),
                credit_alerts::resolution.eq(&row.resolution),
                credit_alerts::resolved_at.eq(row.resolved_at),
            ))
            .execute(connection)
            .map_err(CreditAlertRepositoryError::persistence)?;
            if updated == 1 {
                return Ok(());
            }
            let exists = credit_alerts::table
                .find(row.id)
                .select(credit_alerts::id)
                .first::<uuid::Uuid>(connection)
                .optional()
                .map_err(CreditAlertRepositoryError::persistence)?;
            Err(if exists.is_some() {
                CreditAlertRepositoryError::NotActive(alert_id)
            } else {
                CreditAlertRepositoryError::NotFound(alert_id)
            })
        })
        .await
    }

    async fn list_active(&self) -> CreditAlertRepositoryResult<Vec<CreditAlert>> {
        self.run_blocking(move |connection| {
            credit_alerts::table
                .filter(credit_alerts::status.eq(AlertStatus::Active.as_str()))
                .order(credit_alerts::created_at.asc())
                .select(CreditAlertRow::as_select())
                .load::<CreditAlertRow>(connection)
                .map_err(CreditAlertRepositoryError::persistence)?
                .into_iter()
                .map(row_to_alert)
                .collect()
        })
        .await
    }
}

fn to_row(alert: &CreditAlert) -> CreditAlertRow {
    CreditAlertRow {
        id: alert.id().into_inner(),
        provider: alert.key().provider().to_owned(),
        model: alert.key().model().to_owned(),
        role: alert.key().role().as_str().to_owned(),
        message: alert.message().to_owned(),
        status: alert.status().as_str().to_owned(),
        resolution: alert.resolution().map(|r| r.as_str().to_owned()),
        created_at: alert.created_at(),
        resolved_at: alert.resolved_at(),
    }
}

fn row_to_alert(row: CreditAlertRow) -> CreditAlertRepositoryResult<CreditAlert> {
    let role =
        Role::try_from(row.role.as_str()).map_err(CreditAlertRepositoryError::invalid_persisted_data)?;
    let key = AlertKey::new(row.provider, row.model, role)
        .map_err(CreditAlertRepositoryError::invalid_persisted_data)?;
    let status = AlertStatus::try_from(row.status.as_str())
        .map_err(CreditAlertRepositoryError::invalid_persisted_data)?;
    let resolution = row
        .resolution
        .as_deref()
        .map(AlertResolution::try_from)
        .transpose()
        .map_err(CreditAlertRepositoryError::invalid_persisted_data)?;
    Ok(CreditAlert::from_persisted(
        CreditAlertId::from_uuid(row.id),
        key,
        row.message,
        status,
        resolution,
        (row.created_at, row.resolved_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    #[test]
    fn resolved_alert_round_trips_through_row() {
        let key = AlertKey::new("claude", "opus", Role::Coder).expect("valid key");
        let mut alert = CreditAlert::raise(key, "Credit balance is too low", &DefaultClock);
        alert
            .resolve(AlertResolution::Retried, &DefaultClock)
            .expect("active alert resolves");

        let row = to_row(&alert);
        assert_eq!(row.status, "dismissed");
        assert_eq!(row.resolution.as_deref(), Some("retried"));
        assert_eq!(row_to_alert(row).expect("alert conversion"), alert);
    }

    #[test]
    fn unknown_role_is_invalid_persisted_data() {
        let key = AlertKey::new("codex", "o3", Role::Reviewer).expect("valid key");
        let mut row = to_row(&CreditAlert::raise(key, "quota", &DefaultClock));
        row.role = "auditor".to_owned();
        assert!(matches!(
            row_to_alert(row),
            Err(CreditAlertRepositoryError::InvalidPersistedData(_))
        ));
    }
}
