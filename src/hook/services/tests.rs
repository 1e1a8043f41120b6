//! Orchestrator and bridge tests.

use std::sync::Arc;

use super::{HookEventBridge, HookOrchestrator, event_for_transition};
use crate::hook::{
    adapters::memory::{RecordingHookExecutor, StaticLocator},
    domain::{
        HookConfig, HookEvent, HookExecutionError, HookFailureMode, HookKind, HookPayload,
        HookValidationError,
    },
};
use crate::project::{ProjectPath, Role};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Actor, TaskStatus},
    services::{CreateTaskRequest, TaskLifecycleService, TransitionContext},
};
use mockable::{Clock, DefaultClock};
use rstest::rstest;

type Orchestrator = HookOrchestrator<RecordingHookExecutor, StaticLocator>;

fn orchestrator(
    global: &[HookConfig],
    project: &[HookConfig],
    executor: &RecordingHookExecutor,
) -> Orchestrator {
    HookOrchestrator::new(
        global,
        project,
        Arc::new(executor.clone()),
        Arc::new(StaticLocator::new(["notify.sh", "lint.sh"])),
    )
}

fn payload(event: HookEvent) -> HookPayload {
    HookPayload::new(event, DefaultClock.utc())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_override_suppresses_global_hook() {
    let executor = RecordingHookExecutor::new();
    let global = [HookConfig::webhook(
        "notify",
        "task.completed",
        "https://hooks.example.com/done",
    )];
    let project = [HookConfig::webhook(
        "notify",
        "task.completed",
        "https://hooks.example.com/done",
    )
    .disabled()];
    let hooks = orchestrator(&global, &project, &executor);

    assert_eq!(hooks.hooks_for_event(HookEvent::TaskCompleted).count(), 1);
    assert!(hooks.dry_run(HookEvent::TaskCompleted).is_empty());
    let report = hooks
        .execute_hooks_for_event(&payload(HookEvent::TaskCompleted))
        .await;

    assert!(report.results.is_empty());
    assert!(executor.executions().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn continue_on_error_runs_every_hook() {
    let executor = RecordingHookExecutor::new().failing("first");
    let global = [
        HookConfig::script("first", "task.failed", "notify.sh"),
        HookConfig::webhook("second", "task.failed", "https://hooks.example.com/f"),
    ];
    let hooks = orchestrator(&global, &[], &executor);

    let report = hooks
        .execute_hooks_for_event(&payload(HookEvent::TaskFailed))
        .await;

    assert_eq!(report.results.len(), 2);
    assert!(!report.aborted);
    let outcomes: Vec<(&str, bool)> = report
        .results
        .iter()
        .map(|result| (result.hook_name.as_str(), result.success))
        .collect();
    assert_eq!(outcomes, vec![("first", false), ("second", true)]);
    assert!(matches!(
        report.results.first().and_then(|result| result.error.clone()),
        Some(HookExecutionError::NonZeroExit { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fail_fast_stops_after_first_failure() {
    let executor = RecordingHookExecutor::new().failing("first");
    let global = [
        HookConfig::script("first", "task.failed", "notify.sh"),
        HookConfig::script("second", "task.failed", "lint.sh"),
    ];
    let hooks = orchestrator(&global, &[], &executor);

    let report = hooks
        .execute_with_mode(&payload(HookEvent::TaskFailed), HookFailureMode::FailFast)
        .await;

    assert!(report.aborted);
    assert_eq!(report.results.len(), 1);
    assert_eq!(executor.executed_names(), vec!["first".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_matching_hooks_run_in_merged_order() {
    let executor = RecordingHookExecutor::new();
    let global = [
        HookConfig::script("lint", "task.review", "lint.sh"),
        HookConfig::script("notify", "task.completed", "notify.sh"),
    ];
    let project = [HookConfig::webhook(
        "deploy",
        "task.completed",
        "https://deploy.example.com/hook",
    )];
    let hooks = orchestrator(&global, &project, &executor);

    let report = hooks
        .execute_hooks_for_event(&payload(HookEvent::TaskCompleted))
        .await;

    assert!(report.all_succeeded());
    assert_eq!(
        executor.executed_names(),
        vec!["notify".to_owned(), "deploy".to_owned()]
    );
    assert_eq!(hooks.hooks_of_kind(HookKind::Webhook).count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_enabled_hook_is_reported_not_run() {
    let executor = RecordingHookExecutor::new();
    let global = [HookConfig::new("broken", "task.failed", "email", "ops@example.com")];
    let hooks = orchestrator(&global, &[], &executor);

    let report = hooks
        .execute_hooks_for_event(&payload(HookEvent::TaskFailed))
        .await;

    assert_eq!(report.results.len(), 1);
    assert!(matches!(
        report.results.first().and_then(|result| result.error.clone()),
        Some(HookExecutionError::Invalid(_))
    ));
    assert!(executor.executions().is_empty());
}

#[rstest]
fn validation_reports_every_hook() {
    let executor = RecordingHookExecutor::new();
    let global = [
        HookConfig::script("notify", "task.completed", "notify.sh --verbose"),
        HookConfig::script("missing", "task.completed", "no-such-tool"),
        HookConfig::webhook("bad-url", "task.completed", "hooks.example.com"),
        HookConfig::script("notify", "task.failed", "notify.sh"),
    ];
    let hooks = orchestrator(&global, &[], &executor);

    let verdicts = hooks.validate_all_hooks();

    assert_eq!(verdicts.len(), 4);
    let errors: Vec<Vec<HookValidationError>> =
        verdicts.iter().map(|verdict| verdict.errors.clone()).collect();
    assert_eq!(errors.first(), Some(&Vec::new()));
    assert_eq!(
        errors.get(1),
        Some(&vec![HookValidationError::ExecutableNotFound(
            "no-such-tool".to_owned()
        )])
    );
    assert!(matches!(
        errors.get(2).map(Vec::as_slice),
        Some([HookValidationError::InvalidUrl { .. }])
    ));
    assert_eq!(
        errors.get(3),
        Some(&vec![HookValidationError::DuplicateName("notify".to_owned())])
    );
    assert!(verdicts.first().is_some_and(|verdict| verdict.valid));
}

#[rstest]
#[case(TaskStatus::Pending, TaskStatus::InProgress, HookEvent::TaskStarted)]
#[case(TaskStatus::InProgress, TaskStatus::Review, HookEvent::TaskReview)]
#[case(TaskStatus::Review, TaskStatus::Pending, HookEvent::TaskRejected)]
#[case(TaskStatus::Review, TaskStatus::InProgress, HookEvent::TaskRejected)]
#[case(TaskStatus::InProgress, TaskStatus::Pending, HookEvent::TaskReleased)]
#[case(TaskStatus::Failed, TaskStatus::Pending, HookEvent::TaskRestarted)]
#[case(TaskStatus::Review, TaskStatus::Completed, HookEvent::TaskCompleted)]
#[case(TaskStatus::Review, TaskStatus::Disputed, HookEvent::TaskDisputed)]
#[case(TaskStatus::InProgress, TaskStatus::Partial, HookEvent::TaskPartial)]
fn transitions_map_to_taxonomy(
    #[case] from: TaskStatus,
    #[case] to: TaskStatus,
    #[case] expected: HookEvent,
) {
    assert_eq!(event_for_transition(from, to), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bridge_dispatches_lifecycle_events_per_project() {
    let executor = RecordingHookExecutor::new();
    let project = ProjectPath::new("/work/app").expect("valid project path");
    let global_hooks = [HookConfig::script("notify", "task.completed", "notify.sh")];
    let project_hooks = [
        HookConfig::script("started", "task.started", "notify.sh"),
        HookConfig::script("done", "project.completed", "notify.sh"),
    ];
    let bridge = HookEventBridge::new(Arc::new(orchestrator(&global_hooks, &[], &executor)))
        .with_project(
            project.clone(),
            Arc::new(orchestrator(&global_hooks, &project_hooks, &executor)),
        );
    let tasks = TaskLifecycleService::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::new(DefaultClock),
    )
    .with_event_publisher(Arc::new(bridge));
    let reviewer = TransitionContext::new(Actor::agent(Role::Reviewer, "codex", "o3"));

    let task = tasks
        .create_task(CreateTaskRequest::new(project, "Add parser"))
        .await
        .expect("create");
    tasks
        .start(task.id(), TransitionContext::human())
        .await
        .expect("start");
    tasks
        .submit_for_review(task.id(), TransitionContext::human())
        .await
        .expect("submit");
    tasks.approve(task.id(), reviewer).await.expect("approve");

    assert_eq!(
        executor.executed_names(),
        vec!["started".to_owned(), "notify".to_owned(), "done".to_owned()]
    );
    let completed = executor
        .executions()
        .into_iter()
        .find(|execution| execution.hook_name == "notify")
        .expect("notify ran");
    assert_eq!(completed.payload.event, HookEvent::TaskCompleted);
    assert_eq!(
        completed.payload.data.get("from_status").and_then(serde_json::Value::as_str),
        Some("review")
    );
}
