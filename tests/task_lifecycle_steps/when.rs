//! When steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, reviewer, run_async};
use eyre::WrapErr;
use gantry::runner::services::ClaimOutcome;
use gantry::task::{
    domain::TaskStatus,
    services::{RejectRequest, RestartRequest, TransitionContext, TransitionTaskRequest},
};
use rstest_bdd_macros::when;

#[when("the runner claims the next task")]
fn runner_claims_next(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let runner_id = world
        .runner
        .as_ref()
        .map(gantry::runner::domain::Runner::id)
        .ok_or_else(|| eyre::eyre!("missing runner in scenario world"))?;
    match run_async(world.registry.claim_next(runner_id)).wrap_err("claim next task")? {
        ClaimOutcome::Claimed { runner, task } => {
            world.runner = Some(runner);
            world.task = Some(task);
            Ok(())
        }
        other => Err(eyre::eyre!("expected a claim, got {other:?}")),
    }
}

#[when("the task is submitted for review")]
fn task_submitted(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let transition = run_async(
        world
            .tasks
            .submit_for_review(task_id, TransitionContext::human()),
    )
    .wrap_err("submit task for review")?;
    world.task = Some(transition.task);
    Ok(())
}

#[when("the reviewer approves the task")]
fn reviewer_approves(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let transition = run_async(
        world
            .tasks
            .approve(task_id, TransitionContext::new(reviewer())),
    )
    .wrap_err("approve task")?;
    world.task = Some(transition.task);
    Ok(())
}

#[when("the reviewer rejects the task {count:u32} times")]
fn reviewer_rejects(world: &mut TaskLifecycleWorld, count: u32) -> Result<(), eyre::Report> {
    reject_times(world, count)
}

/// Drives the task back into review before each of `count` rejections.
pub fn reject_times(world: &mut TaskLifecycleWorld, count: u32) -> Result<(), eyre::Report> {
    for attempt in 1..=count {
        let task_id = world.task()?.id();
        if world.task()?.status() == TaskStatus::Pending {
            run_async(world.tasks.start(task_id, TransitionContext::human()))
                .wrap_err("start task before review")?;
        }
        run_async(
            world
                .tasks
                .submit_for_review(task_id, TransitionContext::human()),
        )
        .wrap_err("submit task before rejection")?;
        let outcome = run_async(world.tasks.reject(RejectRequest::new(
            task_id,
            reviewer(),
            format!("attempt {attempt} misses the edge cases"),
        )))
        .wrap_err("reject task")?;
        world.task = Some(outcome.task().clone());
    }
    Ok(())
}

#[when(r#"the task is restarted with guidance "{guidance}""#)]
fn task_restarted(world: &mut TaskLifecycleWorld, guidance: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let transition = run_async(
        world
            .tasks
            .restart(RestartRequest::new(task_id).with_guidance(guidance)),
    )
    .wrap_err("restart task")?;
    world.task = Some(transition.task);
    Ok(())
}

#[when(r#"the task is transitioned to "{target}""#)]
fn task_transitioned(world: &mut TaskLifecycleWorld, target: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .tasks
            .transition_task(TransitionTaskRequest::new(task_id, target)),
    );
    if let Ok(transition) = &result {
        world.task = Some(transition.task.clone());
    }
    world.last_transition_result = Some(result);
    Ok(())
}
