//! Error types for credit alert validation.

use super::CreditAlertId;
use thiserror::Error;

/// Errors returned while constructing or resolving alerts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CreditDomainError {
    /// The provider name is empty after trimming.
    #[error("alert provider must not be empty")]
    EmptyProvider,

    /// The model name is empty after trimming.
    #[error("alert model must not be empty")]
    EmptyModel,

    /// The alert was already dismissed or retried.
    #[error("credit alert {0} is not active")]
    NotActive(CreditAlertId),
}

/// Error returned while parsing stored alert status or resolution values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown alert value: {0}")]
pub struct ParseAlertValueError(pub String);
