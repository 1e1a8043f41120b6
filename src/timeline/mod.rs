//! Live push stream of an in-flight invocation's sub-events.
//!
//! Each task with a running invocation owns a broadcast channel. Observers
//! attach with [`TimelineHub::subscribe`] and only see frames emitted after
//! they attached; history belongs to the audit trail. The channel closes
//! itself on a terminal event, so observers never unsubscribe explicitly.

mod event;
mod hub;

pub use event::{TimelineEvent, TimelineFrame};
pub use hub::{
    DEFAULT_TIMELINE_CAPACITY, TimelineError, TimelineHub, TimelineResult, TimelineSubscription,
};
