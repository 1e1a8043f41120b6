//! Serialized payload handed to hooks.

use super::{HOOK_TAXONOMY_VERSION, HookEvent};
use crate::project::ProjectPath;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Event description delivered to every hook.
///
/// Scripts receive the JSON form on stdin and in `GANTRY_HOOK_PAYLOAD`;
/// webhooks receive it as the request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookPayload {
    /// Taxonomy version the event name belongs to.
    pub version: u32,
    /// Triggering event.
    pub event: HookEvent,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
    /// Project the event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectPath>,
    /// Event-specific details.
    pub data: serde_json::Value,
}

impl HookPayload {
    /// Creates a payload with no details.
    #[must_use]
    pub const fn new(event: HookEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            version: HOOK_TAXONOMY_VERSION,
            event,
            occurred_at,
            project: None,
            data: serde_json::Value::Null,
        }
    }

    /// Attaches the owning project.
    #[must_use]
    pub fn with_project(mut self, project: ProjectPath) -> Self {
        self.project = Some(project);
        self
    }

    /// Attaches event-specific details.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Renders the payload as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens for non-string map
    /// keys inside `data`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
