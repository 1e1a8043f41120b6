//! Port contracts for the runner registry.

pub mod gate;
pub mod repository;

pub use gate::{WorkGate, WorkGateError, WorkGateResult};
pub use repository::{
    AssignOutcome, RunnerRepository, RunnerRepositoryError, RunnerRepositoryResult, StopOutcome,
};
