//! Shared world state for task lifecycle BDD scenarios.

use std::sync::Arc;

use gantry::project::{ProjectPath, Role};
use gantry::runner::{
    adapters::memory::InMemoryRunnerRepository, domain::Runner, services::RunnerRegistryService,
};
use gantry::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Actor, Task, TaskTransition},
    services::{TaskLifecycleError, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;

/// Registry type used by the BDD world.
pub type TestRegistry =
    RunnerRegistryService<InMemoryRunnerRepository, InMemoryTaskRepository, DefaultClock>;

/// Scenario world for task lifecycle behaviour tests.
pub struct TaskLifecycleWorld {
    pub tasks: TestTaskService,
    pub registry: TestRegistry,
    pub project: Option<ProjectPath>,
    pub runner: Option<Runner>,
    pub task: Option<Task>,
    pub last_transition_result: Option<Result<TaskTransition, TaskLifecycleError>>,
}

impl TaskLifecycleWorld {
    /// Creates a world over empty in-memory repositories.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let task_repository = Arc::new(InMemoryTaskRepository::new());
        let tasks = TaskLifecycleService::new(Arc::clone(&task_repository), Arc::clone(&clock));
        let registry = RunnerRegistryService::new(
            Arc::new(InMemoryRunnerRepository::new()),
            tasks.clone(),
            task_repository,
            clock,
        );

        Self {
            tasks,
            registry,
            project: None,
            runner: None,
            task: None,
            last_transition_result: None,
        }
    }

    /// Returns the scenario's project.
    pub fn project(&self) -> Result<ProjectPath, eyre::Report> {
        self.project
            .clone()
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }

    /// Returns the scenario's task.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for TaskLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskLifecycleWorld {
    TaskLifecycleWorld::default()
}

/// The reviewer identity used by every scenario.
#[must_use]
pub fn reviewer() -> Actor {
    Actor::agent(Role::Reviewer, "openai", "o3")
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
