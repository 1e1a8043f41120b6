//! Fixed reference table for tests and embedders that know their URLs.

use crate::activity::ports::{ProjectReferenceResolver, ReferenceResult};
use crate::project::ProjectPath;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolver answering from a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceResolver {
    references: HashMap<ProjectPath, String>,
}

impl StaticReferenceResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference for `project`.
    #[must_use]
    pub fn with_reference(mut self, project: ProjectPath, reference: impl Into<String>) -> Self {
        self.references.insert(project, reference.into());
        self
    }
}

#[async_trait]
impl ProjectReferenceResolver for StaticReferenceResolver {
    async fn resolve(&self, project: &ProjectPath) -> ReferenceResult<Option<String>> {
        Ok(self.references.get(project).cloned())
    }
}
