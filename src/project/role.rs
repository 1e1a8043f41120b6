//! AI role taxonomy.

use super::ParseRoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical function performed by an AI provider invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Breaks work into tasks.
    Orchestrator,
    /// Implements tasks.
    Coder,
    /// Approves or rejects implemented tasks.
    Reviewer,
}

impl Role {
    /// All roles in pipeline order.
    pub const ALL: [Self; 3] = [Self::Orchestrator, Self::Coder, Self::Reviewer];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Coder => "coder",
            Self::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "orchestrator" => Ok(Self::Orchestrator),
            "coder" => Ok(Self::Coder),
            "reviewer" => Ok(Self::Reviewer),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}
