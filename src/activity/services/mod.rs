//! Application services for activity aggregation.

mod aggregator;

pub use aggregator::{ActivityAggregator, ActivityError, ActivityResult};
