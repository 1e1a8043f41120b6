//! Credit-exhaustion alert lifecycle.
//!
//! When the invocation ledger classifies a failure as credit exhaustion an
//! alert is raised for the `(provider, model, role)` triple. At most one
//! alert per triple is active at a time. While it is active, every project
//! routing that role through the triple is paused; dismissing or retrying
//! the alert lifts the pause, and a retry also signals runners to re-attempt
//! the paused invocation.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
