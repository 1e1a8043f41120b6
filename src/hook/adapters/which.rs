//! `PATH`-based executable lookup.

use crate::hook::ports::ExecutableLocator;
use std::path::PathBuf;

/// Resolves programs the way a shell would, via [`which`].
///
/// Paths containing a separator are checked directly, relative to the
/// current directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhichLocator;

impl ExecutableLocator for WhichLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
