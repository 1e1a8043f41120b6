//! Domain model for runners.

mod policy;
mod runner;

pub use policy::{HeartbeatPolicy, Liveness, OrphanPolicy};
pub use runner::{ActiveTask, ParseRunnerStatusError, PersistedRunnerData, Runner, RunnerId, RunnerStatus};
