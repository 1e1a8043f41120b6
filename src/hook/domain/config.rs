//! Raw hook definitions as supplied by configuration.

use super::ParseHookValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hook execution mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Run a shell command.
    Script,
    /// POST to an HTTP endpoint.
    Webhook,
}

impl HookKind {
    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Webhook => "webhook",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HookKind {
    type Error = ParseHookValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "script" => Ok(Self::Script),
            "webhook" => Ok(Self::Webhook),
            _ => Err(ParseHookValueError(value.to_owned())),
        }
    }
}

const fn enabled_by_default() -> bool {
    true
}

/// A hook exactly as configured.
///
/// Event and type stay strings so that a typo is reported by validation
/// instead of failing the whole configuration load.
///
/// # Examples
///
/// ```
/// use gantry::hook::domain::HookConfig;
///
/// let config: HookConfig = serde_json::from_str(
///     r#"{"name": "notify", "event": "task.completed", "type": "webhook",
///         "target": "https://hooks.example.com/done"}"#,
/// )
/// .expect("valid hook config");
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Identity of the hook within its scope; merge key.
    pub name: String,
    /// Dotted event name, such as `task.completed`.
    pub event: String,
    /// `script` or `webhook`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Command line or URL.
    pub target: String,
    /// Disabled hooks stay listed but never run.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl HookConfig {
    /// Creates an enabled hook definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        event: impl Into<String>,
        kind: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            event: event.into(),
            kind: kind.into(),
            target: target.into(),
            enabled: true,
        }
    }

    /// Creates an enabled script hook.
    #[must_use]
    pub fn script(
        name: impl Into<String>,
        event: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self::new(name, event, HookKind::Script.as_str(), command)
    }

    /// Creates an enabled webhook.
    #[must_use]
    pub fn webhook(
        name: impl Into<String>,
        event: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::new(name, event, HookKind::Webhook.as_str(), url)
    }

    /// Marks the hook as disabled.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns `true` when the configured event is `event`.
    #[must_use]
    pub fn listens_to(&self, event: super::HookEvent) -> bool {
        self.event == event.as_str()
    }

    /// Returns the parsed kind, if recognised.
    #[must_use]
    pub fn kind(&self) -> Option<HookKind> {
        HookKind::try_from(self.kind.as_str()).ok()
    }
}
