//! Project path value object.

use super::ProjectDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filesystem path identifying a project managed by runners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Creates a validated project path.
    ///
    /// Surrounding whitespace and a single trailing slash are removed so that
    /// `/work/app/` and `/work/app` address the same project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyProjectPath`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.strip_suffix('/').unwrap_or(trimmed)
        } else {
            trimmed
        };
        if normalized.is_empty() {
            return Err(ProjectDomainError::EmptyProjectPath);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the path as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
