//! Port contracts for hook execution.

pub mod executor;
pub mod locator;

pub use executor::HookExecutor;
pub use locator::ExecutableLocator;
