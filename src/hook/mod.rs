//! Lifecycle hooks for Gantry.
//!
//! Hooks let external scripts and webhooks react to task and project
//! lifecycle events. Global and per-project hook lists are merged by name,
//! validated without side effects, and dispatched sequentially in merged
//! order with an independent timeout per hook.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
