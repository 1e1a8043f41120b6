//! Per-project provider and model assignments for each role.

use super::{ProjectDomainError, ProjectPath, Role};
use serde::{Deserialize, Serialize};

/// Provider and model backing one role in a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    role: Role,
    provider: String,
    model: String,
}

impl RoleAssignment {
    /// Creates a validated role assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyProvider`] or
    /// [`ProjectDomainError::EmptyModel`] when either name is blank.
    pub fn new(
        role: Role,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProjectDomainError> {
        let provider_name = provider.into().trim().to_owned();
        if provider_name.is_empty() {
            return Err(ProjectDomainError::EmptyProvider);
        }
        let model_name = model.into().trim().to_owned();
        if model_name.is_empty() {
            return Err(ProjectDomainError::EmptyModel);
        }
        Ok(Self {
            role,
            provider: provider_name,
            model: model_name,
        })
    }

    /// Returns the assigned role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns `true` when this assignment is backed by the given triple.
    #[must_use]
    pub fn matches(&self, provider: &str, model: &str, role: Role) -> bool {
        self.role == role && self.provider == provider && self.model == model
    }
}

/// Role assignments configured for one project.
///
/// Reviewers are a list: a project may route each task through several
/// reviewer models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRoster {
    project: ProjectPath,
    assignments: Vec<RoleAssignment>,
}

impl ProjectRoster {
    /// Creates a roster from role assignments.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::MissingReviewer`] when no assignment has
    /// the reviewer role.
    pub fn new(
        project: ProjectPath,
        assignments: impl IntoIterator<Item = RoleAssignment>,
    ) -> Result<Self, ProjectDomainError> {
        let collected: Vec<RoleAssignment> = assignments.into_iter().collect();
        if !collected.iter().any(|a| a.role() == Role::Reviewer) {
            return Err(ProjectDomainError::MissingReviewer(project.to_string()));
        }
        Ok(Self {
            project,
            assignments: collected,
        })
    }

    /// Returns the project this roster belongs to.
    #[must_use]
    pub const fn project(&self) -> &ProjectPath {
        &self.project
    }

    /// Returns all assignments in configuration order.
    #[must_use]
    pub fn assignments(&self) -> &[RoleAssignment] {
        &self.assignments
    }

    /// Returns the assignments for one role.
    pub fn assignments_for(&self, role: Role) -> impl Iterator<Item = &RoleAssignment> {
        self.assignments.iter().filter(move |a| a.role() == role)
    }

    /// Returns the distinct roles the roster covers, in pipeline order.
    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.assignments.iter().any(|a| a.role() == *role))
            .collect()
    }

    /// Returns `true` when the project routes `role` through the given
    /// provider and model.
    #[must_use]
    pub fn uses(&self, provider: &str, model: &str, role: Role) -> bool {
        self.assignments
            .iter()
            .any(|a| a.matches(provider, model, role))
    }
}
