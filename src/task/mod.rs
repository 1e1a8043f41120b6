//! Task lifecycle management for Gantry.
//!
//! This module is the authoritative record of a task's life: the status
//! state machine, the append-only audit trail written once per transition,
//! reviewer rejection counting and the disputes opened when coder and
//! reviewer keep disagreeing. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
