//! Diesel row model for runners.

use super::schema::runners;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for runner records, used for reads and inserts.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = runners)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RunnerRow {
    /// Runner identifier.
    pub id: uuid::Uuid,
    /// Served project path.
    pub project: String,
    /// Host-local process identifier.
    pub pid: Option<i64>,
    /// Lifecycle status.
    pub status: String,
    /// Task currently held.
    pub current_task_id: Option<uuid::Uuid>,
    /// Registration timestamp.
    pub started_at: DateTime<Utc>,
    /// Last heartbeat timestamp.
    pub heartbeat_at: DateTime<Utc>,
}
