//! Webhooks delivered over HTTP.

use crate::hook::domain::{HookExecutionError, HookPayload, WebhookHook};
use std::time::Duration;

/// Header carrying the dotted event name.
pub const HOOK_EVENT_HEADER: &str = "x-gantry-event";

/// POSTs hook payloads as JSON.
#[derive(Debug, Clone, Default)]
pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    /// Creates a sender with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Delivers `payload` to the webhook.
    ///
    /// # Errors
    ///
    /// Returns [`HookExecutionError::TimedOut`] when no response arrives in
    /// time, [`HookExecutionError::Request`] for transport failures and
    /// [`HookExecutionError::Status`] for non-2xx answers.
    pub async fn send(
        &self,
        webhook: &WebhookHook,
        payload: &HookPayload,
        timeout: Duration,
    ) -> Result<(), HookExecutionError> {
        let response = self
            .client
            .post(webhook.url().clone())
            .header(HOOK_EVENT_HEADER, payload.event.as_str())
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    HookExecutionError::TimedOut(timeout)
                } else {
                    HookExecutionError::Request(err.to_string())
                }
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(HookExecutionError::Status(status.as_u16()))
        }
    }
}
