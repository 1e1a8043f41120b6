//! Terminal-status buckets and derived rates.

use super::ActivityRecord;
use crate::project::ProjectPath;
use crate::task::domain::TaskStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Terminal-status counts for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityCounts {
    /// Approved tasks.
    pub completed: u32,
    /// Failed tasks.
    pub failed: u32,
    /// Skipped tasks.
    pub skipped: u32,
    /// Partially landed tasks.
    pub partial: u32,
    /// Disputed tasks.
    pub disputed: u32,
    /// Sum of the above.
    pub total: u32,
}

impl ActivityCounts {
    /// Counts one task under `status`. Non-terminal statuses are ignored.
    pub const fn record(&mut self, status: TaskStatus) {
        let bucket = match status {
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
            TaskStatus::Skipped => &mut self.skipped,
            TaskStatus::Partial => &mut self.partial,
            TaskStatus::Disputed => &mut self.disputed,
            TaskStatus::Pending | TaskStatus::InProgress | TaskStatus::Review => return,
        };
        *bucket = bucket.saturating_add(1);
        self.total = self.total.saturating_add(1);
    }

    /// Adds another bucket's counts.
    #[must_use]
    pub const fn merged(self, other: Self) -> Self {
        Self {
            completed: self.completed.saturating_add(other.completed),
            failed: self.failed.saturating_add(other.failed),
            skipped: self.skipped.saturating_add(other.skipped),
            partial: self.partial.saturating_add(other.partial),
            disputed: self.disputed.saturating_add(other.disputed),
            total: self.total.saturating_add(other.total),
        }
    }
}

/// Counts, activity span and derived rates for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivitySummary {
    /// Terminal-status counts.
    pub counts: ActivityCounts,
    /// Earliest counted finish.
    pub first_activity: Option<DateTime<Utc>>,
    /// Latest counted finish.
    pub last_activity: Option<DateTime<Utc>>,
    /// `completed / total` as a percentage, one decimal; 0 when empty.
    pub success_rate: f64,
    /// `total / max(span hours, 1)`, two decimals.
    pub tasks_per_hour: f64,
}

impl ActivitySummary {
    /// Builds a summary from counts and the observed span.
    #[must_use]
    pub fn new(
        counts: ActivityCounts,
        first_activity: Option<DateTime<Utc>>,
        last_activity: Option<DateTime<Utc>>,
    ) -> Self {
        let span_secs = match (first_activity, last_activity) {
            (Some(first), Some(last)) => (last - first).num_seconds(),
            _ => 0,
        };
        Self {
            counts,
            first_activity,
            last_activity,
            success_rate: success_rate(counts),
            tasks_per_hour: tasks_per_hour(counts.total, span_secs),
        }
    }

    /// Builds a summary over `records`.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Self {
        let mut counts = ActivityCounts::default();
        let mut first: Option<DateTime<Utc>> = None;
        let mut last: Option<DateTime<Utc>> = None;
        for record in records {
            counts.record(record.status);
            first = Some(first.map_or(record.finished_at, |at| at.min(record.finished_at)));
            last = Some(last.map_or(record.finished_at, |at| at.max(record.finished_at)));
        }
        Self::new(counts, first, last)
    }

    /// Combines per-project summaries without rescanning history.
    ///
    /// Counts are summed; the span runs from the earliest first activity to
    /// the latest last activity.
    #[must_use]
    pub fn combine<'a>(summaries: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut counts = ActivityCounts::default();
        let mut first: Option<DateTime<Utc>> = None;
        let mut last: Option<DateTime<Utc>> = None;
        for summary in summaries {
            counts = counts.merged(summary.counts);
            first = earliest(first, summary.first_activity);
            last = latest(last, summary.last_activity);
        }
        Self::new(counts, first, last)
    }
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "rates are reported as rounded decimals"
)]
fn success_rate(counts: ActivityCounts) -> f64 {
    if counts.total == 0 {
        return 0.0;
    }
    let percent = f64::from(counts.completed) * 100.0 / f64::from(counts.total);
    (percent * 10.0).round() / 10.0
}

#[expect(
    clippy::float_arithmetic,
    reason = "rates are reported as rounded decimals"
)]
fn tasks_per_hour(total: u32, span_secs: i64) -> f64 {
    let span_hours = f64::from(i32::try_from(span_secs).unwrap_or(i32::MAX)) / 3_600.0;
    let rate = f64::from(total) / span_hours.max(1.0);
    (rate * 100.0).round() / 100.0
}

/// Activity of one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectActivity {
    /// Project path.
    pub project: ProjectPath,
    /// Project summary.
    pub summary: ActivitySummary,
}

/// Per-project and global activity for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityStats {
    /// Requested trailing window in hours.
    pub window_hours: u32,
    /// One row per project with activity, ordered by path.
    pub projects: Vec<ProjectActivity>,
    /// All projects together.
    pub global: ActivitySummary,
}
