//! Windowed statistics and filtered listings over finished tasks.

use crate::activity::{
    domain::{
        ActivityEntry, ActivityFilter, ActivityRecord, ActivityStats, ActivitySummary,
        ProjectActivity,
    },
    ports::{ActivitySource, ActivitySourceError, ProjectReferenceResolver},
};
use crate::project::ProjectPath;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::warn;

/// Longest a single reference lookup may take before it is abandoned.
const DEFAULT_REFERENCE_TIMEOUT: Duration = Duration::from_secs(2);

/// Service-level errors for activity queries.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Finished-task history could not be read.
    #[error(transparent)]
    Source(#[from] ActivitySourceError),
}

/// Result type for activity queries.
pub type ActivityResult<T> = Result<T, ActivityError>;

/// Computes activity statistics on demand.
pub struct ActivityAggregator<S, C>
where
    S: ActivitySource,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    clock: Arc<C>,
    references: Option<Arc<dyn ProjectReferenceResolver>>,
    reference_timeout: Duration,
}

impl<S, C> Clone for ActivityAggregator<S, C>
where
    S: ActivitySource,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            clock: Arc::clone(&self.clock),
            references: self.references.clone(),
            reference_timeout: self.reference_timeout,
        }
    }
}

impl<S, C> ActivityAggregator<S, C>
where
    S: ActivitySource,
    C: Clock + Send + Sync,
{
    /// Creates an aggregator without reference enrichment.
    #[must_use]
    pub fn new(source: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            source,
            clock,
            references: None,
            reference_timeout: DEFAULT_REFERENCE_TIMEOUT,
        }
    }

    /// Enriches listed entries through `resolver`.
    #[must_use]
    pub fn with_reference_resolver(mut self, resolver: Arc<dyn ProjectReferenceResolver>) -> Self {
        self.references = Some(resolver);
        self
    }

    /// Overrides the per-lookup time limit.
    #[must_use]
    pub const fn with_reference_timeout(mut self, timeout: Duration) -> Self {
        self.reference_timeout = timeout;
        self
    }

    /// Returns one summary per project with finished tasks in the last
    /// `hours_ago` hours, ordered by project path.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Source`] when history cannot be read.
    pub async fn stats_by_project(&self, hours_ago: u32) -> ActivityResult<Vec<ProjectActivity>> {
        let records = self.records_within(hours_ago).await?;
        let mut by_project: BTreeMap<ProjectPath, Vec<ActivityRecord>> = BTreeMap::new();
        for record in records {
            by_project
                .entry(record.project.clone())
                .or_default()
                .push(record);
        }
        Ok(by_project
            .into_iter()
            .map(|(project, rows)| ProjectActivity {
                summary: ActivitySummary::from_records(&rows),
                project,
            })
            .collect())
    }

    /// Returns per-project rows plus the global view of the window.
    ///
    /// The global summary is combined from the project rows rather than
    /// recomputed from history.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Source`] when history cannot be read.
    pub async fn stats(&self, hours_ago: u32) -> ActivityResult<ActivityStats> {
        let projects = self.stats_by_project(hours_ago).await?;
        let global = ActivitySummary::combine(projects.iter().map(|row| &row.summary));
        Ok(ActivityStats {
            window_hours: hours_ago,
            projects,
            global,
        })
    }

    /// Lists finished tasks matching `filter`, newest first.
    ///
    /// Each entry carries its project's reference when one could be resolved
    /// in time. Lookup failures and timeouts leave the reference empty and
    /// never fail the listing.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Source`] when history cannot be read.
    pub async fn list_filtered(&self, filter: &ActivityFilter) -> ActivityResult<Vec<ActivityEntry>> {
        let mut records: Vec<ActivityRecord> = self
            .records_within(filter.hours_ago)
            .await?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();
        records.sort_by_key(|record| (Reverse(record.finished_at), record.task_id));
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }

        let references = self.resolve_references(&records).await;
        Ok(records
            .into_iter()
            .map(|record| {
                let reference = references.get(&record.project).cloned().flatten();
                ActivityEntry { record, reference }
            })
            .collect())
    }

    async fn records_within(&self, hours_ago: u32) -> ActivityResult<Vec<ActivityRecord>> {
        let since = self.window_start(hours_ago);
        Ok(self.source.finished_since(since).await?)
    }

    fn window_start(&self, hours_ago: u32) -> DateTime<Utc> {
        self.clock.utc() - chrono::Duration::hours(i64::from(hours_ago))
    }

    /// Looks up each distinct project once, all lookups running at the same
    /// time so that a listing waits at most one timeout.
    async fn resolve_references(
        &self,
        records: &[ActivityRecord],
    ) -> HashMap<ProjectPath, Option<String>> {
        let mut references = HashMap::new();
        let Some(resolver) = &self.references else {
            return references;
        };
        let projects: BTreeSet<&ProjectPath> =
            records.iter().map(|record| &record.project).collect();
        let mut lookups = JoinSet::new();
        for project in projects {
            let lookup_resolver = Arc::clone(resolver);
            let lookup_project = project.clone();
            let timeout = self.reference_timeout;
            lookups.spawn(async move {
                let reference =
                    lookup_reference(&*lookup_resolver, &lookup_project, timeout).await;
                (lookup_project, reference)
            });
        }
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((project, reference)) => {
                    references.insert(project, reference);
                }
                Err(err) => warn!(error = %err, "project reference lookup aborted"),
            }
        }
        references
    }
}

async fn lookup_reference(
    resolver: &dyn ProjectReferenceResolver,
    project: &ProjectPath,
    timeout: Duration,
) -> Option<String> {
    match tokio::time::timeout(timeout, resolver.resolve(project)).await {
        Ok(Ok(found)) => found,
        Ok(Err(err)) => {
            warn!(project = %project, error = %err, "project reference lookup failed");
            None
        }
        Err(_) => {
            warn!(
                project = %project,
                timeout_ms = timeout.as_millis(),
                "project reference lookup timed out"
            );
            None
        }
    }
}
