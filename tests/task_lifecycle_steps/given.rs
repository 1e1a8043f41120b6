//! Given steps for task lifecycle BDD scenarios.

use super::when::reject_times;
use super::world::{TaskLifecycleWorld, run_async};
use eyre::WrapErr;
use gantry::project::ProjectPath;
use gantry::task::services::CreateTaskRequest;
use rstest_bdd_macros::given;

#[given(r#"a project "{path}""#)]
fn a_project(world: &mut TaskLifecycleWorld, path: String) -> Result<(), eyre::Report> {
    world.project = Some(ProjectPath::new(path).wrap_err("parse project path")?);
    Ok(())
}

#[given(r#"a pending task "{title}""#)]
fn a_pending_task(world: &mut TaskLifecycleWorld, title: String) -> Result<(), eyre::Report> {
    let project = world.project()?;
    let created = run_async(
        world
            .tasks
            .create_task(CreateTaskRequest::new(project, title)),
    )
    .wrap_err("create task for scenario")?;
    world.task = Some(created);
    Ok(())
}

#[given("a runner registered for the project")]
fn a_registered_runner(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let project = world.project()?;
    let runner = run_async(world.registry.register(project, Some(4242)))
        .wrap_err("register runner for scenario")?;
    world.runner = Some(runner);
    Ok(())
}

#[given("the reviewer has rejected the task {count:u32} times")]
fn reviewer_has_rejected(world: &mut TaskLifecycleWorld, count: u32) -> Result<(), eyre::Report> {
    reject_times(world, count)
}
