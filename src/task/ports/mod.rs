//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod events;
pub mod repository;

pub use events::TaskEventPublisher;
pub use repository::{DisputeChange, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
