//! Adapter implementations of the credit alert ports.

pub mod memory;
pub mod postgres;
