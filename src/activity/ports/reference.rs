//! Lookup of a project's external reference, such as its repository URL.

use crate::project::ProjectPath;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for reference lookups.
pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Resolves the external reference of a project.
#[async_trait]
pub trait ProjectReferenceResolver: Send + Sync {
    /// Returns the project's reference, or `None` when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] when the lookup itself failed.
    async fn resolve(&self, project: &ProjectPath) -> ReferenceResult<Option<String>>;
}

/// Errors returned by reference resolvers.
#[derive(Debug, Clone, Error)]
pub enum ReferenceError {
    /// The lookup tool could not be run.
    #[error("reference lookup failed to run: {0}")]
    Io(Arc<std::io::Error>),
    /// The lookup tool ran but failed.
    #[error("reference lookup failed: {0}")]
    Lookup(String),
}

impl From<std::io::Error> for ReferenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
