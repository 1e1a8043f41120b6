//! Port contracts for the invocation ledger.

pub mod repository;
pub mod sink;

pub use repository::{InvocationRepository, InvocationRepositoryError, InvocationRepositoryResult};
pub use sink::{CreditExhaustionNotice, CreditExhaustionSink};
