//! Error types for project domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing project domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The project path is empty after trimming.
    #[error("project path must not be empty")]
    EmptyProjectPath,

    /// The provider name is empty after trimming.
    #[error("provider must not be empty")]
    EmptyProvider,

    /// The model name is empty after trimming.
    #[error("model must not be empty")]
    EmptyModel,

    /// A roster was built without any reviewer assignment.
    #[error("project roster for {0} must assign at least one reviewer")]
    MissingReviewer(String),
}

/// Error returned while parsing a role name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
