//! Port contracts for activity aggregation.

pub mod reference;
pub mod source;

pub use reference::{ProjectReferenceResolver, ReferenceError, ReferenceResult};
pub use source::{ActivitySource, ActivitySourceError, ActivitySourceResult};
