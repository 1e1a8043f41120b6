//! Gantry: task orchestration and hook dispatch for multi-role AI coding
//! runners.
//!
//! An orchestrator role breaks work into tasks, a coder implements them and
//! reviewers approve or reject them, while runner processes drive that cycle
//! per project. This crate holds the parts with real invariants: the task
//! state machine and audit trail, the runner claim contract, hook dispatch,
//! activity statistics, credit-exhaustion alerts and the live timeline.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture:
//!
//! - **Domain**: value objects and rules with no infrastructure dependencies
//! - **Ports**: `async` traits for persistence and external effects
//! - **Adapters**: in-memory and `PostgreSQL` implementations, subprocess and
//!   HTTP hook executors
//! - **Services**: the operations callers use, built over the ports
//!
//! # Modules
//!
//! - [`project`]: project paths, roles and provider rosters
//! - [`task`]: task lifecycle, audit trail and disputes
//! - [`invocation`]: invocation ledger and failure classification
//! - [`runner`]: runner registry, heartbeats and task claims
//! - [`hook`]: hook configuration merge, validation and dispatch
//! - [`activity`]: windowed throughput and success statistics
//! - [`credit`]: credit-exhaustion alerts that pause runners
//! - [`timeline`]: live sub-event stream of running invocations
//! - [`config`]: engine-wide settings

pub mod activity;
pub mod config;
pub mod credit;
pub mod hook;
pub mod invocation;
pub mod project;
pub mod runner;
pub mod task;
pub mod timeline;

#[cfg(test)]
mod test_support;
