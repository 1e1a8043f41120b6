//! Adapter implementations of the hook ports.

pub mod memory;
pub mod script;
pub mod system;
pub mod webhook;
pub mod which;
