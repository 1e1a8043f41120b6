//! Application services for task lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    CreateTaskRequest, RejectRequest, RejectionOutcome, RestartRequest, ReviewOutcome,
    TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService, TransitionContext,
    TransitionTaskRequest,
};
