//! In-memory task event publishers.

use crate::task::{domain::TaskEvent, ports::TaskEventPublisher};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Publisher that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTaskEventPublisher;

#[async_trait]
impl TaskEventPublisher for NoopTaskEventPublisher {
    async fn publish(&self, _event: &TaskEvent) {}
}

/// Publisher that keeps every event for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTaskEventPublisher {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl RecordingTaskEventPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events in publication order.
    #[must_use]
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskEventPublisher for RecordingTaskEventPublisher {
    async fn publish(&self, event: &TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
