//! Domain model for credit alerts.

mod alert;
mod error;

pub use alert::{AlertKey, AlertResolution, AlertStatus, CreditAlert, CreditAlertId, RetrySignal};
pub use error::{CreditDomainError, ParseAlertValueError};
