//! Credit alert services.

mod alerts;

pub use alerts::{CreditAlertError, CreditAlertResult, CreditAlertService};
