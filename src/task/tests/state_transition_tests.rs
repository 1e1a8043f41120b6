//! Unit tests for task status transition validation.

use crate::project::ProjectPath;
use crate::task::domain::{NewTask, Task, TaskDomainError, TaskStatus};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
fn pending_task(clock: DefaultClock) -> Task {
    Task::new(
        NewTask {
            project: ProjectPath::new("/work/app").expect("valid project path"),
            title: "Transition test".to_owned(),
            section: None,
            source_file: None,
        },
        &clock,
    )
    .expect("valid task")
}

#[rstest]
#[case(TaskStatus::Pending, TaskStatus::InProgress, true)]
#[case(TaskStatus::Pending, TaskStatus::Skipped, true)]
#[case(TaskStatus::Pending, TaskStatus::Review, false)]
#[case(TaskStatus::Pending, TaskStatus::Completed, false)]
#[case(TaskStatus::Pending, TaskStatus::Pending, false)]
#[case(TaskStatus::InProgress, TaskStatus::Review, true)]
#[case(TaskStatus::InProgress, TaskStatus::Failed, true)]
#[case(TaskStatus::InProgress, TaskStatus::Skipped, true)]
#[case(TaskStatus::InProgress, TaskStatus::Partial, true)]
#[case(TaskStatus::InProgress, TaskStatus::Pending, true)]
#[case(TaskStatus::InProgress, TaskStatus::Completed, false)]
#[case(TaskStatus::InProgress, TaskStatus::Disputed, false)]
#[case(TaskStatus::Review, TaskStatus::Completed, true)]
#[case(TaskStatus::Review, TaskStatus::Failed, true)]
#[case(TaskStatus::Review, TaskStatus::Disputed, true)]
#[case(TaskStatus::Review, TaskStatus::Partial, true)]
#[case(TaskStatus::Review, TaskStatus::Pending, true)]
#[case(TaskStatus::Review, TaskStatus::InProgress, true)]
#[case(TaskStatus::Review, TaskStatus::Skipped, false)]
#[case(TaskStatus::Completed, TaskStatus::Pending, true)]
#[case(TaskStatus::Completed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Failed, TaskStatus::Pending, true)]
#[case(TaskStatus::Failed, TaskStatus::Review, false)]
#[case(TaskStatus::Disputed, TaskStatus::Pending, true)]
#[case(TaskStatus::Disputed, TaskStatus::Completed, false)]
#[case(TaskStatus::Skipped, TaskStatus::Pending, true)]
#[case(TaskStatus::Partial, TaskStatus::Pending, true)]
#[case(TaskStatus::Partial, TaskStatus::Completed, false)]
fn can_transition_to_returns_expected(
    #[case] from: TaskStatus,
    #[case] to: TaskStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
fn terminal_statuses_only_lead_back_to_pending() {
    for from in TaskStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
        let targets = TaskStatus::ALL
            .into_iter()
            .filter(|to| from.can_transition_to(*to))
            .collect::<Vec<_>>();
        assert_eq!(targets, vec![TaskStatus::Pending], "from {from}");
    }
}

#[rstest]
fn invalid_transition_leaves_task_untouched(clock: DefaultClock, pending_task: Task) {
    let mut task = pending_task;
    let before = task.clone();

    let result = task.transition_to(TaskStatus::Completed, &clock);

    assert_eq!(
        result,
        Err(TaskDomainError::InvalidTransition {
            task_id: task.id(),
            from: TaskStatus::Pending,
            to: TaskStatus::Completed,
        })
    );
    assert_eq!(task, before);
}

#[rstest]
fn restart_from_terminal_resets_rejections(clock: DefaultClock, pending_task: Task) {
    let mut task = pending_task;
    task.transition_to(TaskStatus::InProgress, &clock)
        .expect("claim");
    task.transition_to(TaskStatus::Review, &clock)
        .expect("submit");
    assert_eq!(task.record_rejection(), 1);
    task.transition_to(TaskStatus::Failed, &clock)
        .expect("fail");

    let from = task
        .transition_to(TaskStatus::Pending, &clock)
        .expect("restart");

    assert_eq!(from, TaskStatus::Failed);
    assert_eq!(task.rejection_count(), 0);
}

#[rstest]
fn rejection_return_keeps_counter(clock: DefaultClock, pending_task: Task) {
    let mut task = pending_task;
    task.transition_to(TaskStatus::InProgress, &clock)
        .expect("claim");
    task.transition_to(TaskStatus::Review, &clock)
        .expect("submit");
    task.record_rejection();

    task.transition_to(TaskStatus::Pending, &clock)
        .expect("return to queue");

    assert_eq!(task.rejection_count(), 1);
}

#[rstest]
#[case("pending", TaskStatus::Pending)]
#[case(" IN_PROGRESS ", TaskStatus::InProgress)]
#[case("partial", TaskStatus::Partial)]
fn status_parses_storage_names(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::try_from(raw), Ok(expected));
}

#[rstest]
fn status_parse_rejects_unknown_names() {
    let result = TaskStatus::try_from("done");
    assert!(result.is_err());
}
