//! In-memory task adapters for tests and single-process embedding.

mod events;
mod task;

pub use events::{NoopTaskEventPublisher, RecordingTaskEventPublisher};
pub use task::InMemoryTaskRepository;
