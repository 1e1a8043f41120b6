//! Per-project memoisation of reference lookups.

use crate::activity::ports::{ProjectReferenceResolver, ReferenceResult};
use crate::project::ProjectPath;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Caches the answers of an inner resolver for the lifetime of the value.
///
/// Both hits and misses are cached. Failed lookups are not, so a transient
/// failure is retried on the next request.
#[derive(Debug)]
pub struct CachedReferenceResolver<R> {
    inner: R,
    cache: Mutex<HashMap<ProjectPath, Option<String>>>,
}

impl<R: ProjectReferenceResolver> CachedReferenceResolver<R> {
    /// Wraps `inner` with an empty cache.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, project: &ProjectPath) -> Option<Option<String>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .cloned()
    }
}

#[async_trait]
impl<R: ProjectReferenceResolver> ProjectReferenceResolver for CachedReferenceResolver<R> {
    async fn resolve(&self, project: &ProjectPath) -> ReferenceResult<Option<String>> {
        if let Some(hit) = self.cached(project) {
            return Ok(hit);
        }
        let resolved = self.inner.resolve(project).await?;
        debug!(%project, found = resolved.is_some(), "caching project reference");
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.clone(), resolved.clone());
        Ok(resolved)
    }
}
