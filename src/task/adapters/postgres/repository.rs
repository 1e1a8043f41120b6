//! `PostgreSQL` repository implementation for task lifecycle storage.

use super::{
    models::{AuditEntryRow, DisputeRow, TaskRow},
    schema::{task_audit_entries, task_disputes, tasks},
};
use crate::project::ProjectPath;
use crate::task::{
    domain::{
        Actor, AuditEntry, AuditEntryId, CommitSha, Dispute, DisputeId, DisputeKind,
        DisputeStatus, PersistedDisputeData, PersistedTaskData, SectionRef, Task, TaskId,
        TaskStatus,
    },
    ports::{DisputeChange, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Transitions run inside one transaction: a status-guarded `UPDATE`
/// followed by the audit `INSERT` and any dispute write.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn commit_transition(
        &self,
        task: &Task,
        expected: TaskStatus,
        entry: &AuditEntry,
        dispute: &DisputeChange,
    ) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task)?;
        let audit_row = to_audit_row(entry)?;
        let dispute_write = DisputeWrite::from_change(dispute);
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let updated = diesel::update(
                    tasks::table
                        .filter(tasks::id.eq(row.id))
                        .filter(tasks::status.eq(expected.as_str())),
                )
                .set((
                    tasks::status.eq(&row.status),
                    tasks::rejection_count.eq(row.rejection_count),
                    tasks::updated_at.eq(row.updated_at),
                ))
                .execute(tx)?;

                if updated == 0 {
                    let stored = tasks::table
                        .filter(tasks::id.eq(row.id))
                        .select(tasks::status)
                        .first::<String>(tx)
                        .optional()?;
                    return Err(match stored {
                        None => TaskRepositoryError::NotFound(task_id),
                        Some(actual) => TaskRepositoryError::StatusConflict {
                            task_id,
                            expected,
                            actual: parse_status(&actual)?,
                        },
                    });
                }

                diesel::insert_into(task_audit_entries::table)
                    .values(&audit_row)
                    .execute(tx)?;
                dispute_write.apply(tx, task_id)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_by_project(&self, project: &ProjectPath) -> TaskRepositoryResult<Vec<Task>> {
        let project_key = project.as_str().to_owned();
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::project.eq(project_key))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn audit_trail(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<AuditEntry>> {
        self.run_blocking(move |connection| {
            task_audit_entries::table
                .filter(task_audit_entries::task_id.eq(task_id.into_inner()))
                .order(task_audit_entries::created_at.asc())
                .select(AuditEntryRow::as_select())
                .load::<AuditEntryRow>(connection)?
                .into_iter()
                .map(row_to_audit_entry)
                .collect()
        })
        .await
    }

    async fn audit_since(&self, since: DateTime<Utc>) -> TaskRepositoryResult<Vec<AuditEntry>> {
        self.run_blocking(move |connection| {
            task_audit_entries::table
                .filter(task_audit_entries::created_at.ge(since))
                .order(task_audit_entries::created_at.asc())
                .select(AuditEntryRow::as_select())
                .load::<AuditEntryRow>(connection)?
                .into_iter()
                .map(row_to_audit_entry)
                .collect()
        })
        .await
    }

    async fn find_open_dispute(&self, task_id: TaskId) -> TaskRepositoryResult<Option<Dispute>> {
        self.run_blocking(move |connection| {
            let row = task_disputes::table
                .filter(task_disputes::task_id.eq(task_id.into_inner()))
                .filter(task_disputes::status.eq(DisputeStatus::Open.as_str()))
                .order(task_disputes::created_at.desc())
                .select(DisputeRow::as_select())
                .first::<DisputeRow>(connection)
                .optional()?;
            row.map(row_to_dispute).transpose()
        })
        .await
    }

    async fn list_disputes(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Dispute>> {
        self.run_blocking(move |connection| {
            task_disputes::table
                .filter(task_disputes::task_id.eq(task_id.into_inner()))
                .order(task_disputes::created_at.asc())
                .select(DisputeRow::as_select())
                .load::<DisputeRow>(connection)?
                .into_iter()
                .map(row_to_dispute)
                .collect()
        })
        .await
    }
}

fn unknown_value(column: &str, value: &str) -> TaskRepositoryError {
    TaskRepositoryError::invalid_persisted_data(std::io::Error::other(format!(
        "unknown {column} value '{value}'"
    )))
}

fn parse_status(value: &str) -> TaskRepositoryResult<TaskStatus> {
    TaskStatus::try_from(value).map_err(TaskRepositoryError::invalid_persisted_data)
}

fn to_task_row(task: &Task) -> TaskRepositoryResult<TaskRow> {
    let section_priority = task
        .section()
        .map(|section| i32::try_from(section.priority()))
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;
    let rejection_count =
        i32::try_from(task.rejection_count()).map_err(TaskRepositoryError::persistence)?;
    Ok(TaskRow {
        id: task.id().into_inner(),
        project: task.project().as_str().to_owned(),
        title: task.title().to_owned(),
        status: task.status().as_str().to_owned(),
        section_name: task.section().map(|section| section.name().to_owned()),
        section_priority,
        rejection_count,
        source_file: task.source_file().map(str::to_owned),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        project,
        title,
        status,
        section_name,
        section_priority,
        rejection_count,
        source_file,
        created_at,
        updated_at,
    } = row;

    let section = match (section_name, section_priority) {
        (Some(name), Some(priority)) => {
            let checked_priority =
                u32::try_from(priority).map_err(TaskRepositoryError::invalid_persisted_data)?;
            Some(
                SectionRef::new(name, checked_priority)
                    .map_err(TaskRepositoryError::invalid_persisted_data)?,
            )
        }
        _ => None,
    };

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        project: ProjectPath::new(project).map_err(TaskRepositoryError::invalid_persisted_data)?,
        title,
        status: parse_status(&status)?,
        section,
        rejection_count: u32::try_from(rejection_count)
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        source_file,
        created_at,
        updated_at,
    }))
}

fn to_audit_row(entry: &AuditEntry) -> TaskRepositoryResult<AuditEntryRow> {
    Ok(AuditEntryRow {
        id: entry.id().into_inner(),
        task_id: entry.task_id().into_inner(),
        actor: serde_json::to_value(entry.actor()).map_err(TaskRepositoryError::persistence)?,
        from_status: entry.from_status().as_str().to_owned(),
        to_status: entry.to_status().as_str().to_owned(),
        notes: entry.notes().map(str::to_owned),
        commit_sha: entry.commit_sha().map(|sha| sha.as_str().to_owned()),
        time_in_prior_status_ms: i64::try_from(entry.time_in_prior_status_ms())
            .map_err(TaskRepositoryError::persistence)?,
        created_at: entry.created_at(),
    })
}

fn row_to_audit_entry(row: AuditEntryRow) -> TaskRepositoryResult<AuditEntry> {
    let actor = serde_json::from_value::<Actor>(row.actor)
        .map_err(TaskRepositoryError::invalid_persisted_data)?;
    let commit_sha = row
        .commit_sha
        .map(CommitSha::new)
        .transpose()
        .map_err(TaskRepositoryError::invalid_persisted_data)?;
    Ok(AuditEntry::from_persisted(
        AuditEntryId::from_uuid(row.id),
        TaskId::from_uuid(row.task_id),
        actor,
        parse_status(&row.from_status)?,
        parse_status(&row.to_status)?,
        row.notes,
        commit_sha,
        u64::try_from(row.time_in_prior_status_ms).unwrap_or(0),
        row.created_at,
    ))
}

/// Dispute row write carried into the transition transaction.
enum DisputeWrite {
    Skip,
    Insert(DisputeRow),
    Update(DisputeRow),
}

impl DisputeWrite {
    fn from_change(change: &DisputeChange) -> Self {
        match change {
            DisputeChange::Unchanged => Self::Skip,
            DisputeChange::Open(dispute) => Self::Insert(to_dispute_row(dispute)),
            DisputeChange::Resolve(dispute) => Self::Update(to_dispute_row(dispute)),
        }
    }

    fn apply(&self, tx: &mut PgConnection, task_id: TaskId) -> TaskRepositoryResult<()> {
        match self {
            Self::Skip => Ok(()),
            Self::Insert(row) => {
                diesel::insert_into(task_disputes::table)
                    .values(row)
                    .execute(tx)
                    .map_err(|err| match err {
                        // idx_task_disputes_one_open
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DisputeAlreadyOpen(task_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                Ok(())
            }
            Self::Update(row) => {
                let updated = diesel::update(task_disputes::table.find(row.id))
                    .set(row)
                    .execute(tx)?;
                if updated == 0 {
                    return Err(TaskRepositoryError::DisputeNotFound(DisputeId::from_uuid(
                        row.id,
                    )));
                }
                Ok(())
            }
        }
    }
}

fn to_dispute_row(dispute: &Dispute) -> DisputeRow {
    DisputeRow {
        id: dispute.id().into_inner(),
        task_id: dispute.task_id().into_inner(),
        kind: dispute.kind().as_str().to_owned(),
        reason: dispute.reason().to_owned(),
        coder_position: dispute.coder_position().map(str::to_owned),
        reviewer_position: dispute.reviewer_position().map(str::to_owned),
        status: dispute.status().as_str().to_owned(),
        resolution_notes: dispute.resolution_notes().map(str::to_owned),
        created_at: dispute.created_at(),
        resolved_at: dispute.resolved_at(),
    }
}

fn row_to_dispute(row: DisputeRow) -> TaskRepositoryResult<Dispute> {
    let kind = match row.kind.as_str() {
        "repeated_rejection" => DisputeKind::RepeatedRejection,
        other => return Err(unknown_value("dispute kind", other)),
    };
    let status = match row.status.as_str() {
        "open" => DisputeStatus::Open,
        "resolved" => DisputeStatus::Resolved,
        other => return Err(unknown_value("dispute status", other)),
    };
    Ok(Dispute::from_persisted(PersistedDisputeData {
        id: DisputeId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        kind,
        reason: row.reason,
        coder_position: row.coder_position,
        reviewer_position: row.reviewer_position,
        status,
        resolution_notes: row.resolution_notes,
        created_at: row.created_at,
        resolved_at: row.resolved_at,
    }))
}
