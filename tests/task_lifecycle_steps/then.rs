//! Then steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use eyre::WrapErr;
use gantry::task::{
    domain::{DisputeStatus, TaskDomainError, TaskStatus},
    services::TaskLifecycleError,
};
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = world.task()?.id();
    let stored = run_async(world.tasks.find_by_id(task_id))
        .wrap_err("load task")?
        .ok_or_else(|| eyre::eyre!("task {task_id} disappeared"))?;

    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            stored.status().as_str()
        ));
    }
    Ok(())
}

#[then("the runner holds the task")]
fn runner_holds_task(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let held = world
        .runner
        .as_ref()
        .and_then(gantry::runner::domain::Runner::current_task_id);
    if held != Some(task_id) {
        return Err(eyre::eyre!("expected runner to hold {task_id}, holds {held:?}"));
    }
    Ok(())
}

#[then("the rejection count is {count:u32}")]
fn rejection_count_is(world: &TaskLifecycleWorld, count: u32) -> Result<(), eyre::Report> {
    let actual = world.task()?.rejection_count();
    if actual != count {
        return Err(eyre::eyre!("expected {count} rejections, found {actual}"));
    }
    Ok(())
}

fn open_disputes(world: &TaskLifecycleWorld) -> Result<usize, eyre::Report> {
    let task_id = world.task()?.id();
    let disputes = run_async(world.tasks.disputes(task_id)).wrap_err("list disputes")?;
    Ok(disputes
        .iter()
        .filter(|dispute| dispute.status() == DisputeStatus::Open)
        .count())
}

#[then("the task has an open dispute")]
fn has_open_dispute(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    match open_disputes(world)? {
        1 => Ok(()),
        other => Err(eyre::eyre!("expected one open dispute, found {other}")),
    }
}

#[then("the task has no open dispute")]
fn has_no_open_dispute(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    match open_disputes(world)? {
        0 => Ok(()),
        other => Err(eyre::eyre!("expected no open dispute, found {other}")),
    }
}

#[then("the audit trail has {count:usize} entries")]
fn audit_trail_has(world: &TaskLifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let trail = run_async(world.tasks.audit_trail(task_id)).wrap_err("load audit trail")?;
    if trail.len() != count {
        return Err(eyre::eyre!(
            "expected {count} audit entries, found {}",
            trail.len()
        ));
    }
    Ok(())
}

#[then("the transition fails with an invalid transition error")]
fn fails_with_invalid_transition(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_transition_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;
    if !matches!(
        result,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::InvalidTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidTransition error, got {result:?}"
        ));
    }
    Ok(())
}

#[then("the transition fails with an invalid status error")]
fn fails_with_invalid_status(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_transition_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;
    if !matches!(result, Err(TaskLifecycleError::InvalidStatus(_))) {
        return Err(eyre::eyre!("expected InvalidStatus error, got {result:?}"));
    }
    Ok(())
}
