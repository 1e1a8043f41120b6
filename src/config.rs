//! Engine configuration handed in by the embedding process.
//!
//! The engine never reads files: callers parse their configuration source
//! into a [`serde_json::Value`] (or deserialise [`EngineConfig`] directly)
//! and pass the result in. Every section falls back to its defaults.

use crate::hook::domain::{HookConfig, HookSettings};
use crate::runner::domain::HeartbeatPolicy;
use crate::task::domain::ReviewPolicy;
use crate::timeline::{DEFAULT_TIMELINE_CAPACITY, TimelineHub};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The value does not have the expected shape.
    #[error("invalid engine configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Tunables for every engine service.
///
/// # Examples
///
/// ```
/// use gantry::config::EngineConfig;
/// use gantry::runner::domain::OrphanPolicy;
/// use serde_json::json;
///
/// let config = EngineConfig::from_value(json!({
///     "heartbeat": { "orphan_policy": "return_to_pending" },
///     "hooks": [
///         { "name": "notify", "event": "task.completed", "type": "script", "target": "notify.sh" }
///     ]
/// }))
/// .expect("valid configuration");
///
/// assert_eq!(config.heartbeat.orphan_policy, OrphanPolicy::ReturnToPending);
/// assert_eq!(config.heartbeat.staleness_threshold_secs, 120);
/// assert!(config.hooks.iter().all(|hook| hook.enabled));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Review and dispute policy.
    pub review: ReviewPolicy,
    /// Runner liveness policy.
    pub heartbeat: HeartbeatPolicy,
    /// Hook dispatch settings.
    pub hook_settings: HookSettings,
    /// Global hook definitions, merged under each project's hooks.
    pub hooks: Vec<HookConfig>,
    /// Frames buffered per live timeline.
    pub timeline_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            review: ReviewPolicy::default(),
            heartbeat: HeartbeatPolicy::default(),
            hook_settings: HookSettings::default(),
            hooks: Vec::new(),
            timeline_capacity: DEFAULT_TIMELINE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Reads a configuration from an already-parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value has the wrong shape,
    /// such as an unknown orphan policy.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Builds a timeline hub with the configured capacity.
    #[must_use]
    pub fn timeline_hub<C: Clock>(&self, clock: Arc<C>) -> TimelineHub<C> {
        TimelineHub::new(clock, self.timeline_capacity)
    }
}
