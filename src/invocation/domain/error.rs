//! Error types for invocation domain validation.

use thiserror::Error;

/// Errors returned while constructing invocation records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationDomainError {
    /// The provider name is empty after trimming.
    #[error("invocation provider must not be empty")]
    EmptyProvider,

    /// The model name is empty after trimming.
    #[error("invocation model must not be empty")]
    EmptyModel,
}
