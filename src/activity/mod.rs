//! Activity aggregation for dashboards.
//!
//! Statistics are derived from the audit trail on demand and never stored.
//! A task counts once per window, under the terminal status it still holds,
//! and rates use the observed activity span rather than the requested
//! window so that sparse activity is not inflated.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
