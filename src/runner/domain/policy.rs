//! Heartbeat staleness and orphan handling policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What happens to a stale runner's in-progress task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Only report the orphan; an operator or supervisor decides.
    #[default]
    ReportOnly,
    /// Return the task to `pending` and retire the stale runner.
    ReturnToPending,
}

/// Heartbeat configuration.
///
/// # Examples
///
/// ```
/// use gantry::runner::domain::{HeartbeatPolicy, OrphanPolicy};
///
/// let policy = HeartbeatPolicy::default();
/// assert_eq!(policy.staleness_threshold_secs, 120);
/// assert_eq!(policy.orphan_policy, OrphanPolicy::ReportOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatPolicy {
    /// Seconds without a heartbeat after which a runner is presumed dead.
    pub staleness_threshold_secs: u64,
    /// Handling of tasks held by stale runners.
    pub orphan_policy: OrphanPolicy,
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: 120,
            orphan_policy: OrphanPolicy::ReportOnly,
        }
    }
}

impl HeartbeatPolicy {
    /// Short threshold with automatic reclaim, for unattended hosts.
    #[must_use]
    pub const fn self_healing() -> Self {
        Self {
            staleness_threshold_secs: 60,
            orphan_policy: OrphanPolicy::ReturnToPending,
        }
    }

    /// Returns the staleness threshold as a duration.
    #[must_use]
    pub fn staleness_threshold(&self) -> Duration {
        i64::try_from(self.staleness_threshold_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Classifies a heartbeat timestamp relative to `now`.
    #[must_use]
    pub fn liveness(&self, heartbeat_at: DateTime<Utc>, now: DateTime<Utc>) -> Liveness {
        let silent_for = now.signed_duration_since(heartbeat_at);
        if silent_for > self.staleness_threshold() {
            Liveness::Stale {
                last_heartbeat: heartbeat_at,
                silent_for_secs: silent_for.num_seconds(),
            }
        } else {
            Liveness::Alive
        }
    }
}

/// Heartbeat-derived health of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Liveness {
    /// The runner heartbeated within the threshold.
    Alive,
    /// The runner missed the threshold and is presumed dead.
    Stale {
        /// Last recorded heartbeat.
        last_heartbeat: DateTime<Utc>,
        /// Seconds since the last heartbeat.
        silent_for_secs: i64,
    },
    /// The runner stopped cleanly.
    Stopped,
}

impl Liveness {
    /// Returns `true` for [`Liveness::Stale`].
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}
