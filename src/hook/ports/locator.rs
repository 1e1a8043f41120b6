//! Executable lookup port used by script hook validation.

use std::path::PathBuf;

/// Resolves a program name or path to an executable file.
pub trait ExecutableLocator: Send + Sync {
    /// Returns the resolved executable, or `None` when nothing runnable
    /// matches.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}
