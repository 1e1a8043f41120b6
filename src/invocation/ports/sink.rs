//! Outbound notification of credit-exhaustion failures.

use crate::invocation::domain::InvocationId;
use crate::project::Role;
use crate::task::domain::TaskId;
use async_trait::async_trait;

/// Details of an invocation classified as credit exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditExhaustionNotice {
    /// Offending invocation.
    pub invocation_id: InvocationId,
    /// Task the invocation worked on.
    pub task_id: TaskId,
    /// Provider whose account is depleted.
    pub provider: String,
    /// Model that was invoked.
    pub model: String,
    /// Role that was invoked.
    pub role: Role,
    /// Provider error text.
    pub message: String,
}

/// Receives credit-exhaustion notices from the ledger.
///
/// Implementations record their own failures; a notice never fails the
/// ledger write that produced it.
#[async_trait]
pub trait CreditExhaustionSink: Send + Sync {
    /// Handles one notice.
    async fn credit_exhausted(&self, notice: &CreditExhaustionNotice);
}
