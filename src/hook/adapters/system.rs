//! Executor dispatching to the script runner or the webhook sender.

use super::{script::ScriptRunner, webhook::WebhookSender};
use crate::hook::{
    domain::{Hook, HookAction, HookExecutionError, HookPayload},
    ports::HookExecutor,
};
use async_trait::async_trait;
use std::time::Duration;

/// Production hook executor.
#[derive(Debug, Clone, Default)]
pub struct SystemHookExecutor {
    scripts: ScriptRunner,
    webhooks: WebhookSender,
}

impl SystemHookExecutor {
    /// Creates an executor from its two halves.
    #[must_use]
    pub const fn new(scripts: ScriptRunner, webhooks: WebhookSender) -> Self {
        Self { scripts, webhooks }
    }
}

#[async_trait]
impl HookExecutor for SystemHookExecutor {
    async fn execute(
        &self,
        hook: &Hook,
        payload: &HookPayload,
        timeout: Duration,
    ) -> Result<(), HookExecutionError> {
        match hook.action() {
            HookAction::Script(script) => self.scripts.run(script, payload, timeout).await,
            HookAction::Webhook(webhook) => self.webhooks.send(webhook, payload, timeout).await,
        }
    }
}
