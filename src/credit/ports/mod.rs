//! Port contracts for credit alerts.

pub mod repository;

pub use repository::{
    CreditAlertRepository, CreditAlertRepositoryError, CreditAlertRepositoryResult, RaiseOutcome,
};
