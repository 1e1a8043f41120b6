//! Diesel row model for credit alerts.

use super::schema::credit_alerts;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for credit alerts, used for reads and inserts.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = credit_alerts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditAlertRow {
    /// Alert identifier.
    pub id: uuid::Uuid,
    /// Provider name.
    pub provider: String,
    /// Model name.
    pub model: String,
    /// Role name.
    pub role: String,
    /// Provider error text.
    pub message: String,
    /// Lifecycle status.
    pub status: String,
    /// How the alert was cleared.
    pub resolution: Option<String>,
    /// Raise timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}
