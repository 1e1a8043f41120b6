//! Hook orchestration services.

mod bridge;
mod orchestrator;

pub use bridge::{HookEventBridge, event_for_transition, payload_for};
pub use orchestrator::HookOrchestrator;

#[cfg(test)]
mod tests;
