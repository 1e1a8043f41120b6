//! Hook configuration, taxonomy and execution records.

mod config;
mod error;
mod event;
mod hook;
mod merge;
mod payload;
mod report;

pub use config::{HookConfig, HookKind};
pub use error::{HookExecutionError, HookValidationError, ParseHookValueError};
pub use event::{HOOK_TAXONOMY_VERSION, HookEvent};
pub use hook::{Hook, HookAction, ScriptHook, WebhookHook};
pub use merge::{HookOrigin, MergedHook, merge_hooks};
pub use payload::HookPayload;
pub use report::{
    HookDispatchReport, HookExecutionResult, HookFailureMode, HookSettings, HookValidation,
};
