//! Activity records and derived statistics.

mod entry;
mod stats;

pub use entry::{ActivityEntry, ActivityFilter, ActivityRecord};
pub use stats::{ActivityCounts, ActivityStats, ActivitySummary, ProjectActivity};
