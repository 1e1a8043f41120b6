//! Records invocations and forwards credit-exhaustion failures.

use crate::invocation::{
    domain::{
        FailureClass, Invocation, InvocationDomainError, InvocationId, InvocationOutcome,
        InvocationPayload, NewInvocation,
    },
    ports::{
        CreditExhaustionNotice, CreditExhaustionSink, InvocationRepository,
        InvocationRepositoryError,
    },
};
use crate::project::Role;
use crate::task::domain::TaskId;
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Request payload for recording one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInvocationRequest {
    task_id: TaskId,
    role: Role,
    provider: String,
    model: String,
    outcome: InvocationOutcome,
    rejection_number: u32,
    payload: Option<InvocationPayload>,
}

impl RecordInvocationRequest {
    /// Creates a request for a first attempt without payload.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        role: Role,
        provider: impl Into<String>,
        model: impl Into<String>,
        outcome: InvocationOutcome,
    ) -> Self {
        Self {
            task_id,
            role,
            provider: provider.into(),
            model: model.into(),
            outcome,
            rejection_number: 0,
            payload: None,
        }
    }

    /// Sets the coder attempt ordinal.
    #[must_use]
    pub const fn with_rejection_number(mut self, rejection_number: u32) -> Self {
        self.rejection_number = rejection_number;
        self
    }

    /// Attaches the prompt/response payload.
    #[must_use]
    pub fn with_payload(mut self, payload: InvocationPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Service-level errors for the invocation ledger.
#[derive(Debug, Error)]
pub enum InvocationLedgerError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] InvocationDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] InvocationRepositoryError),
}

/// Result type for invocation ledger operations.
pub type InvocationLedgerResult<T> = Result<T, InvocationLedgerError>;

/// Invocation ledger service.
pub struct InvocationLedgerService<R, C>
where
    R: InvocationRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    credit_sink: Option<Arc<dyn CreditExhaustionSink>>,
}

impl<R, C> Clone for InvocationLedgerService<R, C>
where
    R: InvocationRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            credit_sink: self.credit_sink.clone(),
        }
    }
}

impl<R, C> InvocationLedgerService<R, C>
where
    R: InvocationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a ledger without a credit sink.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            credit_sink: None,
        }
    }

    /// Sets the sink notified about credit-exhaustion failures.
    #[must_use]
    pub fn with_credit_sink(mut self, sink: Arc<dyn CreditExhaustionSink>) -> Self {
        self.credit_sink = Some(sink);
        self
    }

    /// Appends one classified invocation record.
    ///
    /// A credit-exhaustion failure is reported to the credit sink after the
    /// record is persisted; it is data, not an error to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationLedgerError`] when validation or persistence
    /// fails.
    pub async fn record(
        &self,
        request: RecordInvocationRequest,
    ) -> InvocationLedgerResult<Invocation> {
        let RecordInvocationRequest {
            task_id,
            role,
            provider,
            model,
            outcome,
            rejection_number,
            payload,
        } = request;
        let invocation = Invocation::new(
            NewInvocation {
                task_id,
                role,
                provider,
                model,
                outcome,
                rejection_number,
            },
            &*self.clock,
        )?;
        self.repository
            .append(&invocation, payload.as_ref())
            .await?;
        debug!(
            invocation_id = %invocation.id(),
            %task_id,
            role = %role,
            class = invocation.failure_class().as_str(),
            "invocation recorded"
        );

        if invocation.failure_class() == FailureClass::CreditExhausted {
            self.notify_exhaustion(&invocation).await;
        }
        Ok(invocation)
    }

    /// Returns a task's invocations grouped by role, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationLedgerError::Repository`] when lookup fails.
    pub async fn by_role(
        &self,
        task_id: TaskId,
    ) -> InvocationLedgerResult<BTreeMap<Role, Vec<Invocation>>> {
        let mut grouped: BTreeMap<Role, Vec<Invocation>> = BTreeMap::new();
        for invocation in self.repository.list_for_task(task_id).await? {
            grouped
                .entry(invocation.role())
                .or_default()
                .push(invocation);
        }
        Ok(grouped)
    }

    /// Returns the most recent invocation of `role` for a task.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationLedgerError::Repository`] when lookup fails.
    pub async fn latest(
        &self,
        task_id: TaskId,
        role: Role,
    ) -> InvocationLedgerResult<Option<Invocation>> {
        let invocations = self.repository.list_for_task(task_id).await?;
        Ok(invocations
            .into_iter()
            .filter(|invocation| invocation.role() == role)
            .max_by_key(Invocation::created_at))
    }

    /// Loads the prompt/response payload of an invocation.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationLedgerError::Repository`] when lookup fails.
    pub async fn payload(
        &self,
        id: InvocationId,
    ) -> InvocationLedgerResult<Option<InvocationPayload>> {
        Ok(self.repository.payload(id).await?)
    }

    async fn notify_exhaustion(&self, invocation: &Invocation) {
        let Some(sink) = self.credit_sink.as_ref() else {
            warn!(
                invocation_id = %invocation.id(),
                provider = invocation.provider(),
                "credit exhaustion detected but no alert sink is configured"
            );
            return;
        };
        let notice = CreditExhaustionNotice {
            invocation_id: invocation.id(),
            task_id: invocation.task_id(),
            provider: invocation.provider().to_owned(),
            model: invocation.model().to_owned(),
            role: invocation.role(),
            message: invocation
                .outcome()
                .error
                .clone()
                .unwrap_or_else(|| "credit exhausted".to_owned()),
        };
        sink.credit_exhausted(&notice).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::adapters::memory::InMemoryInvocationRepository;
    use async_trait::async_trait;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        notices: Mutex<Vec<CreditExhaustionNotice>>,
    }

    #[async_trait]
    impl CreditExhaustionSink for RecordingSink {
        async fn credit_exhausted(&self, notice: &CreditExhaustionNotice) {
            if let Ok(mut notices) = self.notices.lock() {
                notices.push(notice.clone());
            }
        }
    }

    type TestLedger = InvocationLedgerService<InMemoryInvocationRepository, DefaultClock>;

    struct Harness {
        ledger: TestLedger,
        sink: Arc<RecordingSink>,
    }

    #[fixture]
    fn harness() -> Harness {
        let sink = Arc::new(RecordingSink::default());
        let ledger = InvocationLedgerService::new(
            Arc::new(InMemoryInvocationRepository::new()),
            Arc::new(DefaultClock),
        )
        .with_credit_sink(Arc::clone(&sink) as Arc<dyn CreditExhaustionSink>);
        Harness { ledger, sink }
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn exhaustion_is_forwarded_once_per_record(harness: Harness) {
        let task_id = TaskId::new();
        let outcome = InvocationOutcome::failed(Some(1), 50, "Credit balance is too low");

        let recorded = harness
            .ledger
            .record(RecordInvocationRequest::new(
                task_id,
                Role::Coder,
                "claude",
                "opus",
                outcome,
            ))
            .await
            .expect("record");

        assert_eq!(recorded.failure_class(), FailureClass::CreditExhausted);
        let notices = harness.sink.notices.lock().expect("sink lock").clone();
        assert_eq!(notices.len(), 1);
        assert!(notices.iter().all(|n| n.provider == "claude"
            && n.role == Role::Coder
            && n.invocation_id == recorded.id()));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn ordinary_failures_do_not_notify(harness: Harness) {
        harness
            .ledger
            .record(RecordInvocationRequest::new(
                TaskId::new(),
                Role::Reviewer,
                "codex",
                "o3",
                InvocationOutcome::timed_out(1_000),
            ))
            .await
            .expect("record");

        assert!(harness.sink.notices.lock().expect("sink lock").is_empty());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn queries_group_by_role_and_fetch_payload_on_demand(harness: Harness) {
        let task_id = TaskId::new();
        for attempt in 0..2 {
            harness
                .ledger
                .record(
                    RecordInvocationRequest::new(
                        task_id,
                        Role::Coder,
                        "claude",
                        "opus",
                        InvocationOutcome::succeeded(100),
                    )
                    .with_rejection_number(attempt)
                    .with_payload(InvocationPayload {
                        prompt: format!("attempt {attempt}"),
                        response: Some("done".to_owned()),
                    }),
                )
                .await
                .expect("record coder");
        }
        harness
            .ledger
            .record(RecordInvocationRequest::new(
                task_id,
                Role::Reviewer,
                "codex",
                "o3",
                InvocationOutcome::succeeded(40),
            ))
            .await
            .expect("record reviewer");

        let grouped = harness.ledger.by_role(task_id).await.expect("by role");
        assert_eq!(grouped.get(&Role::Coder).map(Vec::len), Some(2));
        assert_eq!(grouped.get(&Role::Reviewer).map(Vec::len), Some(1));

        let latest = harness
            .ledger
            .latest(task_id, Role::Coder)
            .await
            .expect("latest")
            .expect("coder invocation exists");
        let payload = harness
            .ledger
            .payload(latest.id())
            .await
            .expect("payload lookup")
            .expect("payload stored");
        assert!(payload.prompt.starts_with("attempt"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn blank_provider_is_rejected(harness: Harness) {
        let result = harness
            .ledger
            .record(RecordInvocationRequest::new(
                TaskId::new(),
                Role::Coder,
                " ",
                "opus",
                InvocationOutcome::succeeded(1),
            ))
            .await;
        assert!(matches!(
            result,
            Err(InvocationLedgerError::Domain(
                InvocationDomainError::EmptyProvider
            ))
        ));
    }
}
