//! Runner registry and heartbeat coordination.
//!
//! Runners are long-lived processes that claim and execute one task at a
//! time for a project. The registry records them, enforces that a runner
//! holds at most one task and a task is held by at most one runner, and
//! exposes heartbeat staleness so a supervising loop can reclaim orphaned
//! work according to an explicit [`domain::OrphanPolicy`].

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
