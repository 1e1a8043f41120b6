//! Per-task broadcast channels for live timelines.

use super::{TimelineEvent, TimelineFrame};
use crate::project::Role;
use crate::task::domain::TaskId;
use mockable::Clock;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Frames buffered per task before slow observers start skipping.
pub const DEFAULT_TIMELINE_CAPACITY: usize = 256;

/// Errors returned when publishing to a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// No invocation is running for the task.
    #[error("no active invocation for task {0}")]
    NoActiveInvocation(TaskId),
}

/// Result type for timeline publishing.
pub type TimelineResult<T> = Result<T, TimelineError>;

struct Channel {
    sender: broadcast::Sender<TimelineFrame>,
    next_sequence: u64,
    has_output: bool,
}

/// Registry of live timelines keyed by task.
///
/// Publishing happens under one lock so that sequence numbers match channel
/// order.
pub struct TimelineHub<C: Clock> {
    channels: Mutex<HashMap<TaskId, Channel>>,
    clock: Arc<C>,
    capacity: usize,
}

impl<C: Clock> TimelineHub<C> {
    /// Creates a hub buffering up to `capacity` frames per task.
    #[must_use]
    pub fn new(clock: Arc<C>, capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            clock,
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<TaskId, Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the timeline of `task_id` and emits `invocation.started`.
    ///
    /// A timeline left open by an earlier invocation is replaced; its
    /// observers see the stream close.
    pub fn begin(
        &self,
        task_id: TaskId,
        role: Role,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) {
        let (sender, _) = broadcast::channel(self.capacity);
        let mut channels = self.channels();
        if channels.remove(&task_id).is_some() {
            debug!(%task_id, "replacing unfinished timeline");
        }
        let channel = channels.entry(task_id).or_insert(Channel {
            sender,
            next_sequence: 1,
            has_output: false,
        });
        let event = TimelineEvent::InvocationStarted {
            role,
            provider: provider.into(),
            model: model.into(),
        };
        self.emit(channel, event);
    }

    /// Emits `event` on the timeline of `task_id` and returns the delivered
    /// frame. Terminal events close the timeline after delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::NoActiveInvocation`] when no invocation is
    /// running for the task.
    pub fn publish(&self, task_id: TaskId, event: TimelineEvent) -> TimelineResult<TimelineFrame> {
        let mut channels = self.channels();
        let channel = channels
            .get_mut(&task_id)
            .ok_or(TimelineError::NoActiveInvocation(task_id))?;
        let terminal = event.is_terminal();
        let frame = self.emit(channel, event);
        if terminal {
            channels.remove(&task_id);
            debug!(%task_id, sequence = frame.sequence, "timeline closed");
        }
        Ok(frame)
    }

    /// Records a tool call.
    ///
    /// # Errors
    ///
    /// See [`Self::publish`].
    pub fn tool(&self, task_id: TaskId, cmd: impl Into<String>) -> TimelineResult<TimelineFrame> {
        self.publish(task_id, TimelineEvent::Tool { cmd: cmd.into() })
    }

    /// Records an output chunk.
    ///
    /// # Errors
    ///
    /// See [`Self::publish`].
    pub fn output(&self, task_id: TaskId, msg: impl Into<String>) -> TimelineResult<TimelineFrame> {
        self.publish(task_id, TimelineEvent::Output { msg: msg.into() })
    }

    /// Records completion and closes the timeline.
    ///
    /// # Errors
    ///
    /// See [`Self::publish`].
    pub fn complete(
        &self,
        task_id: TaskId,
        success: bool,
        duration_ms: u64,
    ) -> TimelineResult<TimelineFrame> {
        self.publish(
            task_id,
            TimelineEvent::InvocationCompleted {
                success,
                duration_ms,
            },
        )
    }

    /// Records an aborting error and closes the timeline.
    ///
    /// # Errors
    ///
    /// See [`Self::publish`].
    pub fn fail(&self, task_id: TaskId, message: impl Into<String>) -> TimelineResult<TimelineFrame> {
        self.publish(
            task_id,
            TimelineEvent::Error {
                message: message.into(),
            },
        )
    }

    /// Signals that the invocation's output is gone and closes the timeline.
    ///
    /// # Errors
    ///
    /// See [`Self::publish`].
    pub fn log_not_found(&self, task_id: TaskId) -> TimelineResult<TimelineFrame> {
        self.publish(task_id, TimelineEvent::LogNotFound)
    }

    /// Returns `true` while an invocation is running for `task_id`.
    #[must_use]
    pub fn is_active(&self, task_id: TaskId) -> bool {
        self.channels().contains_key(&task_id)
    }

    /// Attaches an observer to the timeline of `task_id`.
    ///
    /// Without a running invocation the subscription yields a single
    /// `no_active_invocation` frame and ends. If the invocation has not
    /// produced output yet, a `waiting_for_log` frame comes first.
    #[must_use]
    pub fn subscribe(&self, task_id: TaskId) -> TimelineSubscription {
        let channels = self.channels();
        let now = self.clock.utc();
        let signal = |event| TimelineFrame {
            sequence: 0,
            emitted_at: now,
            event,
        };
        let Some(channel) = channels.get(&task_id) else {
            return TimelineSubscription {
                task_id,
                pending: VecDeque::from([signal(TimelineEvent::NoActiveInvocation)]),
                receiver: None,
            };
        };
        let mut pending = VecDeque::new();
        if !channel.has_output {
            pending.push_back(signal(TimelineEvent::WaitingForLog));
        }
        TimelineSubscription {
            task_id,
            pending,
            receiver: Some(channel.sender.subscribe()),
        }
    }

    fn emit(&self, channel: &mut Channel, event: TimelineEvent) -> TimelineFrame {
        channel.has_output |= event.is_output();
        let frame = TimelineFrame {
            sequence: channel.next_sequence,
            emitted_at: self.clock.utc(),
            event,
        };
        channel.next_sequence = channel.next_sequence.saturating_add(1);
        // No receivers is normal: nobody is watching.
        if channel.sender.send(frame.clone()).is_err() {
            debug!(sequence = frame.sequence, "timeline frame had no observers");
        }
        frame
    }
}

/// One observer's view of a task timeline.
#[derive(Debug)]
pub struct TimelineSubscription {
    task_id: TaskId,
    pending: VecDeque<TimelineFrame>,
    receiver: Option<broadcast::Receiver<TimelineFrame>>,
}

impl TimelineSubscription {
    /// Returns the observed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Waits for the next frame.
    ///
    /// Returns `None` once the stream has closed. Frames lost because this
    /// observer fell behind are skipped with a warning.
    pub async fn recv(&mut self) -> Option<TimelineFrame> {
        if let Some(frame) = self.pending.pop_front() {
            return Some(frame);
        }
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(frame) => {
                    if frame.event.is_terminal() {
                        self.receiver = None;
                    }
                    return Some(frame);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(task_id = %self.task_id, skipped, "timeline observer lagged");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TimelineError, TimelineHub, TimelineSubscription};
    use crate::project::Role;
    use crate::task::domain::TaskId;
    use crate::test_support::ManualClock;
    use crate::timeline::TimelineEvent;
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    #[fixture]
    fn hub() -> TimelineHub<ManualClock> {
        TimelineHub::new(Arc::new(ManualClock::default()), 8)
    }

    async fn drain(mut subscription: TimelineSubscription) -> Vec<(u64, TimelineEvent)> {
        let mut frames = Vec::new();
        while let Some(frame) = subscription.recv().await {
            frames.push((frame.sequence, frame.event));
        }
        frames
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn idle_task_yields_no_active_invocation(hub: TimelineHub<ManualClock>) {
        let frames = drain(hub.subscribe(TaskId::new())).await;

        assert_eq!(frames, vec![(0, TimelineEvent::NoActiveInvocation)]);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn observer_sees_ordered_frames_until_completion(hub: TimelineHub<ManualClock>) {
        let task_id = TaskId::new();
        hub.begin(task_id, Role::Coder, "anthropic", "sonnet");
        let subscription = hub.subscribe(task_id);

        hub.tool(task_id, "cargo test").expect("tool");
        hub.output(task_id, "all green").expect("output");
        hub.complete(task_id, true, 1_500).expect("complete");

        assert_eq!(
            drain(subscription).await,
            vec![
                (0, TimelineEvent::WaitingForLog),
                (
                    2,
                    TimelineEvent::Tool {
                        cmd: "cargo test".to_owned()
                    }
                ),
                (
                    3,
                    TimelineEvent::Output {
                        msg: "all green".to_owned()
                    }
                ),
                (
                    4,
                    TimelineEvent::InvocationCompleted {
                        success: true,
                        duration_ms: 1_500
                    }
                ),
            ]
        );
        assert!(!hub.is_active(task_id));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn reconnect_after_terminal_event_does_not_replay(hub: TimelineHub<ManualClock>) {
        let task_id = TaskId::new();
        hub.begin(task_id, Role::Reviewer, "openai", "o3");
        hub.output(task_id, "looking").expect("output");
        hub.fail(task_id, "provider crashed").expect("fail");

        let frames = drain(hub.subscribe(task_id)).await;

        assert_eq!(frames, vec![(0, TimelineEvent::NoActiveInvocation)]);
        assert_eq!(
            hub.output(task_id, "late"),
            Err(TimelineError::NoActiveInvocation(task_id))
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn late_observer_skips_waiting_signal(hub: TimelineHub<ManualClock>) {
        let task_id = TaskId::new();
        hub.begin(task_id, Role::Coder, "anthropic", "sonnet");
        hub.output(task_id, "first chunk").expect("output");
        let subscription = hub.subscribe(task_id);
        hub.log_not_found(task_id).expect("log not found");

        assert_eq!(
            drain(subscription).await,
            vec![(3, TimelineEvent::LogNotFound)]
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn lagging_observer_skips_missed_frames(hub: TimelineHub<ManualClock>) {
        let task_id = TaskId::new();
        hub.begin(task_id, Role::Coder, "anthropic", "sonnet");
        let subscription = hub.subscribe(task_id);
        for chunk in 0..20 {
            hub.output(task_id, format!("chunk {chunk}")).expect("output");
        }
        hub.complete(task_id, false, 10).expect("complete");

        let frames = drain(subscription).await;

        assert_eq!(frames.first(), Some(&(0, TimelineEvent::WaitingForLog)));
        assert!(frames.len() < 22);
        assert!(
            frames
                .windows(2)
                .all(|pair| matches!(pair, [(a, _), (b, _)] if a < b))
        );
        assert!(matches!(
            frames.last(),
            Some((22, TimelineEvent::InvocationCompleted { success: false, .. }))
        ));
    }

    #[rstest]
    fn restarting_replaces_open_timeline(hub: TimelineHub<ManualClock>) {
        let task_id = TaskId::new();
        hub.begin(task_id, Role::Coder, "anthropic", "sonnet");
        hub.output(task_id, "abandoned").expect("output");
        hub.begin(task_id, Role::Coder, "anthropic", "sonnet");

        let frame = hub.output(task_id, "fresh").expect("output");

        assert_eq!(frame.sequence, 2);
    }
}
