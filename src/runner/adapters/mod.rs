//! Adapter implementations of the runner ports.

pub mod memory;
pub mod postgres;
