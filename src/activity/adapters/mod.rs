//! Adapter implementations of the activity ports.

pub mod cached;
pub mod git;
pub mod memory;
pub mod task_history;

pub use cached::CachedReferenceResolver;
pub use git::{GitRemoteResolver, normalize_remote_url};
pub use memory::StaticReferenceResolver;
pub use task_history::TaskHistorySource;
