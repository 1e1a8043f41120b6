//! `PostgreSQL` repository implementation for runners.

use super::{models::RunnerRow, schema::runners};
use crate::project::ProjectPath;
use crate::runner::{
    domain::{PersistedRunnerData, Runner, RunnerId, RunnerStatus},
    ports::{
        AssignOutcome, RunnerRepository, RunnerRepositoryError, RunnerRepositoryResult,
        StopOutcome,
    },
};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the runner adapter.
pub type RunnerPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed runner repository.
#[derive(Debug, Clone)]
pub struct PostgresRunnerRepository {
    pool: RunnerPgPool,
}

impl PostgresRunnerRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RunnerPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RunnerRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RunnerRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RunnerRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RunnerRepositoryError::persistence)?
    }
}

fn load(connection: &mut PgConnection, id: RunnerId) -> RunnerRepositoryResult<Runner> {
    let row = runners::table
        .find(id.into_inner())
        .select(RunnerRow::as_select())
        .first::<RunnerRow>(connection)
        .optional()
        .map_err(RunnerRepositoryError::persistence)?
        .ok_or(RunnerRepositoryError::NotFound(id))?;
    row_to_runner(row)
}

#[async_trait]
impl RunnerRepository for PostgresRunnerRepository {
    async fn register(&self, runner: &Runner) -> RunnerRepositoryResult<()> {
        let runner_id = runner.id();
        let row = to_row(runner);
        self.run_blocking(move |connection| {
            diesel::insert_into(runners::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RunnerRepositoryError::Duplicate(runner_id)
                    }
                    _ => RunnerRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: RunnerId) -> RunnerRepositoryResult<Option<Runner>> {
        self.run_blocking(move |connection| match load(connection, id) {
            Ok(runner) => Ok(Some(runner)),
            Err(RunnerRepositoryError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        })
        .await
    }

    async fn touch(&self, id: RunnerId, at: DateTime<Utc>) -> RunnerRepositoryResult<Runner> {
        self.run_blocking(move |connection| {
            diesel::update(runners::table.find(id.into_inner()))
                .set(runners::heartbeat_at.eq(at))
                .execute(connection)
                .map_err(RunnerRepositoryError::persistence)?;
            load(connection, id)
        })
        .await
    }

    async fn try_assign(
        &self,
        id: RunnerId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> RunnerRepositoryResult<AssignOutcome> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                runners::table
                    .find(id.into_inner())
                    .filter(runners::current_task_id.is_null())
                    .filter(runners::status.ne(RunnerStatus::Stopped.as_str())),
            )
            .set((
                runners::current_task_id.eq(Some(task_id.into_inner())),
                runners::status.eq(RunnerStatus::Active.as_str()),
                runners::heartbeat_at.eq(at),
            ))
            .execute(connection);

            match updated {
                Ok(1) => Ok(AssignOutcome::Assigned(load(connection, id)?)),
                Ok(_) => {
                    let runner = load(connection, id)?;
                    Ok(runner
                        .current_task_id()
                        .map_or(AssignOutcome::RunnerStopped, AssignOutcome::RunnerBusy))
                }
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    let holder = runners::table
                        .filter(runners::current_task_id.eq(task_id.into_inner()))
                        .select(runners::id)
                        .first::<uuid::Uuid>(connection)
                        .map_err(RunnerRepositoryError::persistence)?;
                    Ok(AssignOutcome::TaskHeldBy(RunnerId::from_uuid(holder)))
                }
                Err(err) => Err(RunnerRepositoryError::persistence(err)),
            }
        })
        .await
    }

    async fn clear_assignment(&self, id: RunnerId) -> RunnerRepositoryResult<Runner> {
        self.run_blocking(move |connection| {
            diesel::update(
                runners::table
                    .find(id.into_inner())
                    .filter(runners::status.ne(RunnerStatus::Stopped.as_str())),
            )
            .set((
                runners::current_task_id.eq(None::<uuid::Uuid>),
                runners::status.eq(RunnerStatus::Idle.as_str()),
            ))
            .execute(connection)
            .map_err(RunnerRepositoryError::persistence)?;
            load(connection, id)
        })
        .await
    }

    async fn release_if_holding(
        &self,
        id: RunnerId,
        task_id: TaskId,
    ) -> RunnerRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                runners::table
                    .find(id.into_inner())
                    .filter(runners::current_task_id.eq(task_id.into_inner()))
                    .filter(runners::status.ne(RunnerStatus::Stopped.as_str())),
            )
            .set((
                runners::current_task_id.eq(None::<uuid::Uuid>),
                runners::status.eq(RunnerStatus::Idle.as_str()),
            ))
            .execute(connection)
            .map_err(RunnerRepositoryError::persistence)?;
            Ok(updated == 1)
        })
        .await
    }

    async fn stop(&self, id: RunnerId) -> RunnerRepositoryResult<StopOutcome> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                runners::table
                    .find(id.into_inner())
                    .filter(runners::current_task_id.is_null()),
            )
            .set(runners::status.eq(RunnerStatus::Stopped.as_str()))
            .execute(connection)
            .map_err(RunnerRepositoryError::persistence)?;
            let runner = load(connection, id)?;
            match (updated, runner.current_task_id()) {
                (0, Some(held)) => Ok(StopOutcome::Busy(held)),
                _ => Ok(StopOutcome::Stopped(runner)),
            }
        })
        .await
    }

    async fn list(&self) -> RunnerRepositoryResult<Vec<Runner>> {
        self.run_blocking(move |connection| {
            runners::table
                .order(runners::started_at.asc())
                .select(RunnerRow::as_select())
                .load::<RunnerRow>(connection)
                .map_err(RunnerRepositoryError::persistence)?
                .into_iter()
                .map(row_to_runner)
                .collect()
        })
        .await
    }
}

fn to_row(runner: &Runner) -> RunnerRow {
    RunnerRow {
        id: runner.id().into_inner(),
        project: runner.project().as_str().to_owned(),
        pid: runner.pid().map(i64::from),
        status: runner.status().as_str().to_owned(),
        current_task_id: runner.current_task_id().map(TaskId::into_inner),
        started_at: runner.started_at(),
        heartbeat_at: runner.heartbeat_at(),
    }
}

fn row_to_runner(row: RunnerRow) -> RunnerRepositoryResult<Runner> {
    let pid = row
        .pid
        .map(u32::try_from)
        .transpose()
        .map_err(RunnerRepositoryError::invalid_persisted_data)?;
    Ok(Runner::from_persisted(PersistedRunnerData {
        id: RunnerId::from_uuid(row.id),
        project: ProjectPath::new(row.project)
            .map_err(RunnerRepositoryError::invalid_persisted_data)?,
        pid,
        status: RunnerStatus::try_from(row.status.as_str())
            .map_err(RunnerRepositoryError::invalid_persisted_data)?,
        current_task_id: row.current_task_id.map(TaskId::from_uuid),
        started_at: row.started_at,
        heartbeat_at: row.heartbeat_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::{Clock, DefaultClock};

    #[test]
    fn busy_runner_round_trips_through_row() {
        let project = ProjectPath::new("/work/app").expect("valid project path");
        let mut runner = Runner::register(project, Some(31337), &DefaultClock);
        assert!(runner.assign(TaskId::new(), DefaultClock.utc()));

        let row = to_row(&runner);
        assert_eq!(row.status, "active");
        assert_eq!(row.pid, Some(31337));
        assert_eq!(row_to_runner(row).expect("runner conversion"), runner);
    }

    #[test]
    fn negative_pid_is_invalid_persisted_data() {
        let project = ProjectPath::new("/work/app").expect("valid project path");
        let mut row = to_row(&Runner::register(project, None, &DefaultClock));
        row.pid = Some(-1);
        assert!(matches!(
            row_to_runner(row),
            Err(RunnerRepositoryError::InvalidPersistedData(_))
        ));
    }
}
