//! Project identity and role assignments shared across bounded contexts.
//!
//! A project is addressed by its filesystem path. Each project configures
//! which provider and model back each AI role; the roster drives credit
//! alert filtering and role blocking for runners.

mod error;
mod path;
mod role;
mod roster;

pub use error::{ParseRoleError, ProjectDomainError};
pub use path::ProjectPath;
pub use role::Role;
pub use roster::{ProjectRoster, RoleAssignment};
