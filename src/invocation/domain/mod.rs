//! Domain model for recorded invocations.

mod classify;
mod error;
mod invocation;

pub use classify::{FailureClass, ProviderFamily, classify};
pub use error::InvocationDomainError;
pub use invocation::{
    Invocation, InvocationId, InvocationOutcome, InvocationPayload, NewInvocation,
};
