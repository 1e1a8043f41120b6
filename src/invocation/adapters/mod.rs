//! Adapter implementations of the invocation ports.

pub mod memory;
