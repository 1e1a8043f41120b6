//! Domain model for task lifecycle management.
//!
//! The task domain models status transitions, audit entries, reviewer
//! verdicts and disputes while keeping all infrastructure concerns outside
//! of the domain boundary.

mod audit;
mod dispute;
mod error;
mod events;
mod ids;
mod review;
mod status;
mod task;

pub use audit::{Actor, AuditEntry, TransitionRecord};
pub use dispute::{Dispute, DisputeKind, DisputeStatus, OpenDisputeParams, PersistedDisputeData};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use events::{TaskEvent, TaskTransition};
pub use ids::{AuditEntryId, CommitSha, DisputeId, TaskId};
pub use review::{RejectionTarget, ReviewConsensus, ReviewPolicy, ReviewVerdict};
pub use status::TaskStatus;
pub use task::{NewTask, PersistedTaskData, SectionRef, Task};
