//! Diesel row models for task persistence.

use super::schema::{task_audit_entries, task_disputes, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row model for task records, used for both reads and inserts.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Normalised project path.
    pub project: String,
    /// Task title.
    pub title: String,
    /// Lifecycle status.
    pub status: String,
    /// Optional section name.
    pub section_name: Option<String>,
    /// Optional section priority.
    pub section_priority: Option<i32>,
    /// Rejection counter.
    pub rejection_count: i32,
    /// Optional plan file.
    pub source_file: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for audit entries.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_audit_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditEntryRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Task reference.
    pub task_id: uuid::Uuid,
    /// Actor JSON payload.
    pub actor: Value,
    /// Status before the transition.
    pub from_status: String,
    /// Status after the transition.
    pub to_status: String,
    /// Optional notes.
    pub notes: Option<String>,
    /// Optional commit SHA.
    pub commit_sha: Option<String>,
    /// Milliseconds spent in the prior status.
    pub time_in_prior_status_ms: i64,
    /// Transition timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row model for disputes.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_disputes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct DisputeRow {
    /// Dispute identifier.
    pub id: uuid::Uuid,
    /// Task reference.
    pub task_id: uuid::Uuid,
    /// Dispute kind.
    pub kind: String,
    /// Short reason.
    pub reason: String,
    /// Coder position.
    pub coder_position: Option<String>,
    /// Reviewer position.
    pub reviewer_position: Option<String>,
    /// Dispute status.
    pub status: String,
    /// Resolution notes.
    pub resolution_notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}
