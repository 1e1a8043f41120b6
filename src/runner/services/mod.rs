//! Runner registry services.

mod registry;

pub use registry::{
    ClaimOutcome, OrphanAction, OrphanReport, RunnerRegistryError, RunnerRegistryResult,
    RunnerRegistryService,
};
