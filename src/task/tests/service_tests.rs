//! Service orchestration tests for the task lifecycle.

use std::sync::Arc;

use crate::project::{ProjectPath, Role};
use crate::task::{
    adapters::memory::{InMemoryTaskRepository, RecordingTaskEventPublisher},
    domain::{
        Actor, AuditEntry, Dispute, DisputeKind, DisputeStatus, OpenDisputeParams, ReviewPolicy, ReviewVerdict, Task, TaskDomainError,
        TaskEvent, TaskStatus, TransitionRecord,
    },
    ports::{DisputeChange, TaskRepository, TaskRepositoryError},
    services::{
        CreateTaskRequest, RejectRequest, RejectionOutcome, RestartRequest, ReviewOutcome,
        TaskLifecycleError, TaskLifecycleService, TransitionContext, TransitionTaskRequest,
    },
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;

struct Harness {
    service: TestService,
    repository: Arc<InMemoryTaskRepository>,
    events: RecordingTaskEventPublisher,
}

#[fixture]
fn harness() -> Harness {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let events = RecordingTaskEventPublisher::new();
    let service = TaskLifecycleService::new(Arc::clone(&repository), Arc::new(DefaultClock))
        .with_event_publisher(Arc::new(events.clone()));
    Harness {
        service,
        repository,
        events,
    }
}

fn project() -> ProjectPath {
    ProjectPath::new("/work/app").expect("valid project path")
}

fn coder() -> TransitionContext {
    TransitionContext::new(Actor::agent(Role::Coder, "claude", "opus"))
}

fn reviewer() -> Actor {
    Actor::agent(Role::Reviewer, "codex", "o3")
}

async fn create(service: &TestService, title: &str) -> Task {
    service
        .create_task(CreateTaskRequest::new(project(), title))
        .await
        .expect("task creation should succeed")
}

async fn drive_to_review(service: &TestService, task: &Task) {
    service
        .start(task.id(), coder())
        .await
        .expect("claim should succeed");
    service
        .submit_for_review(task.id(), coder())
        .await
        .expect("submit should succeed");
}

async fn drive_to(service: &TestService, task: &Task, target: TaskStatus) {
    match target {
        TaskStatus::Pending => {}
        TaskStatus::InProgress => {
            service.start(task.id(), coder()).await.expect("claim");
        }
        TaskStatus::Review => drive_to_review(service, task).await,
        TaskStatus::Completed => {
            drive_to_review(service, task).await;
            service
                .approve(task.id(), TransitionContext::new(reviewer()))
                .await
                .expect("approve");
        }
        TaskStatus::Failed => {
            service.start(task.id(), coder()).await.expect("claim");
            service.fail(task.id(), coder()).await.expect("fail");
        }
        TaskStatus::Skipped => {
            service
                .skip(task.id(), TransitionContext::human())
                .await
                .expect("skip");
        }
        TaskStatus::Partial => {
            service.start(task.id(), coder()).await.expect("claim");
            service.mark_partial(task.id(), coder()).await.expect("partial");
        }
        TaskStatus::Disputed => {
            for _ in 0..3 {
                let current = service
                    .find_by_id(task.id())
                    .await
                    .expect("lookup")
                    .expect("task exists");
                if current.status() == TaskStatus::Pending {
                    drive_to_review(service, task).await;
                }
                service
                    .reject(RejectRequest::new(task.id(), reviewer(), "needs tests"))
                    .await
                    .expect("reject");
            }
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_persists_and_publishes(harness: Harness) {
    let created = create(&harness.service, "Implement parser").await;

    let fetched = harness
        .service
        .find_by_id(created.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(fetched, Some(created.clone()));
    assert_eq!(harness.events.events(), vec![TaskEvent::Created(created)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn happy_path_writes_one_audit_entry_per_transition(harness: Harness) {
    let task = create(&harness.service, "Implement parser").await;

    drive_to(&harness.service, &task, TaskStatus::Completed).await;

    let trail = harness
        .service
        .audit_trail(task.id())
        .await
        .expect("audit trail");
    let walk = trail
        .iter()
        .map(|entry| (entry.from_status(), entry.to_status()))
        .collect::<Vec<_>>();
    assert_eq!(
        walk,
        vec![
            (TaskStatus::Pending, TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskStatus::Review),
            (TaskStatus::Review, TaskStatus::Completed),
        ]
    );
    assert!(
        trail
            .iter()
            .all(|entry| entry.from_status().can_transition_to(entry.to_status()))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finishing_the_last_task_publishes_project_completion(harness: Harness) {
    let first = create(&harness.service, "First").await;
    let second = create(&harness.service, "Second").await;

    drive_to(&harness.service, &first, TaskStatus::Completed).await;
    let completed_before = harness
        .events
        .events()
        .iter()
        .filter(|event| matches!(event, TaskEvent::ProjectCompleted { .. }))
        .count();
    drive_to(&harness.service, &second, TaskStatus::Skipped).await;
    let completed_after = harness
        .events
        .events()
        .iter()
        .filter(|event| matches!(event, TaskEvent::ProjectCompleted { .. }))
        .count();

    assert_eq!(completed_before, 0);
    assert_eq!(completed_after, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_transition_writes_no_audit_entry(harness: Harness) {
    let task = create(&harness.service, "Guarded").await;

    let result = harness
        .service
        .approve(task.id(), TransitionContext::new(reviewer()))
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::InvalidTransition { .. }
        ))
    ));
    let trail = harness.service.audit_trail(task.id()).await.expect("trail");
    assert!(trail.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_task_parses_status_names(harness: Harness) {
    let task = create(&harness.service, "By name").await;

    let moved = harness
        .service
        .transition_task(TransitionTaskRequest::new(task.id(), "skipped"))
        .await
        .expect("skip by name");
    assert_eq!(moved.task.status(), TaskStatus::Skipped);
    assert_eq!(moved.entry.actor(), &Actor::Human);

    let unknown = harness
        .service
        .transition_task(TransitionTaskRequest::new(task.id(), "archived"))
        .await;
    assert!(matches!(unknown, Err(TaskLifecycleError::InvalidStatus(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_below_threshold_returns_task(harness: Harness) {
    let task = create(&harness.service, "Rejected once").await;
    drive_to_review(&harness.service, &task).await;

    let outcome = harness
        .service
        .reject(RejectRequest::new(task.id(), reviewer(), "missing tests"))
        .await
        .expect("reject");

    let RejectionOutcome::Returned(returned) = outcome else {
        panic!("expected task to be returned, got {outcome:?}");
    };
    assert_eq!(returned.status(), TaskStatus::Pending);
    assert_eq!(returned.rejection_count(), 1);
    let trail = harness.service.audit_trail(task.id()).await.expect("trail");
    assert_eq!(
        trail.last().and_then(AuditEntry::notes),
        Some("missing tests")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_target_follows_policy() {
    let service = TaskLifecycleService::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::new(DefaultClock),
    )
    .with_review_policy(ReviewPolicy::lenient());
    let task = create(&service, "Back to coder").await;
    drive_to_review(&service, &task).await;

    let outcome = service
        .reject(RejectRequest::new(task.id(), reviewer(), "rename things"))
        .await
        .expect("reject");

    assert_eq!(outcome.task().status(), TaskStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn third_rejection_opens_dispute_and_restart_resolves_it(harness: Harness) {
    let task = create(&harness.service, "Contested").await;
    drive_to(&harness.service, &task, TaskStatus::Disputed).await;

    let disputed = harness
        .service
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(disputed.status(), TaskStatus::Disputed);
    assert_eq!(disputed.rejection_count(), 3);
    let disputes = harness.service.disputes(task.id()).await.expect("disputes");
    assert_eq!(disputes.len(), 1);
    assert!(
        disputes
            .iter()
            .all(|dispute| dispute.status() == DisputeStatus::Open)
    );

    let restarted = harness
        .service
        .restart(RestartRequest::new(task.id()).with_guidance("split the tests out"))
        .await
        .expect("restart");

    assert_eq!(restarted.task.status(), TaskStatus::Pending);
    assert_eq!(restarted.task.rejection_count(), 0);
    assert_eq!(restarted.entry.notes(), Some("split the tests out"));
    let resolved = harness.service.disputes(task.id()).await.expect("disputes");
    assert!(
        resolved
            .iter()
            .all(|dispute| dispute.status() == DisputeStatus::Resolved
                && dispute.resolution_notes() == Some("split the tests out"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn generic_return_to_pending_resolves_the_open_dispute(harness: Harness) {
    let task = create(&harness.service, "Contested twice").await;
    drive_to(&harness.service, &task, TaskStatus::Disputed).await;

    let reopened = harness
        .service
        .transition_task(TransitionTaskRequest::new(task.id(), "pending"))
        .await
        .expect("disputed tasks may return to pending");
    assert_eq!(reopened.task.rejection_count(), 0);
    let after_reopen = harness.service.disputes(task.id()).await.expect("disputes");
    assert!(
        after_reopen
            .iter()
            .all(|dispute| dispute.status() == DisputeStatus::Resolved)
    );

    drive_to(&harness.service, &task, TaskStatus::Disputed).await;

    let disputes = harness.service.disputes(task.id()).await.expect("disputes");
    assert_eq!(disputes.len(), 2);
    let open = disputes
        .iter()
        .filter(|dispute| dispute.status() == DisputeStatus::Open)
        .count();
    assert_eq!(open, 1);
    assert_eq!(
        disputes.first().map(Dispute::status),
        Some(DisputeStatus::Resolved)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_open_dispute_rolls_back_the_transition(harness: Harness) {
    let task = create(&harness.service, "Doubly disputed").await;
    drive_to(&harness.service, &task, TaskStatus::Disputed).await;
    let reopened = harness
        .service
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    let trail_before = harness.service.audit_trail(task.id()).await.expect("trail");

    let mut stale = reopened.clone();
    stale
        .transition_to(TaskStatus::Pending, &DefaultClock)
        .expect("disputed tasks may return to pending");
    let entry = AuditEntry::record(
        TransitionRecord {
            task_id: task.id(),
            actor: Actor::Human,
            from_status: TaskStatus::Disputed,
            to_status: TaskStatus::Pending,
            notes: None,
            commit_sha: None,
            prior_status_since: reopened.updated_at(),
        },
        &DefaultClock,
    );
    let second = Dispute::open(
        OpenDisputeParams {
            task_id: task.id(),
            kind: DisputeKind::RepeatedRejection,
            reason: "duplicate".to_owned(),
            coder_position: None,
            reviewer_position: None,
        },
        &DefaultClock,
    );

    let result = harness
        .repository
        .commit_transition(
            &stale,
            TaskStatus::Disputed,
            &entry,
            &DisputeChange::Open(second),
        )
        .await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::DisputeAlreadyOpen(id)) if id == task.id()
    ));
    let stored = harness
        .service
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Disputed);
    let trail_after = harness.service.audit_trail(task.id()).await.expect("trail");
    assert_eq!(trail_after.len(), trail_before.len());
    let disputes = harness.service.disputes(task.id()).await.expect("disputes");
    assert_eq!(disputes.len(), 1);
}

#[rstest]
#[case(TaskStatus::Pending)]
#[case(TaskStatus::InProgress)]
#[case(TaskStatus::Review)]
#[tokio::test(flavor = "multi_thread")]
async fn restart_rejects_non_terminal_tasks(harness: Harness, #[case] status: TaskStatus) {
    let task = create(&harness.service, "Busy").await;
    drive_to(&harness.service, &task, status).await;
    let trail_before = harness.service.audit_trail(task.id()).await.expect("trail");

    let result = harness.service.restart(RestartRequest::new(task.id())).await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::InvalidTransition { from, .. }))
            if from == status
    ));
    let trail_after = harness.service.audit_trail(task.id()).await.expect("trail");
    assert_eq!(trail_before, trail_after);
}

#[rstest]
#[case(TaskStatus::Completed)]
#[case(TaskStatus::Failed)]
#[case(TaskStatus::Disputed)]
#[case(TaskStatus::Skipped)]
#[case(TaskStatus::Partial)]
#[tokio::test(flavor = "multi_thread")]
async fn restart_accepts_terminal_tasks(harness: Harness, #[case] status: TaskStatus) {
    let task = create(&harness.service, "Done").await;
    drive_to(&harness.service, &task, status).await;

    let restarted = harness
        .service
        .restart(RestartRequest::new(task.id()))
        .await
        .expect("restart");

    assert_eq!(restarted.entry.from_status(), status);
    assert_eq!(restarted.task.status(), TaskStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn release_claim_only_applies_to_in_progress(harness: Harness) {
    let task = create(&harness.service, "Release").await;
    drive_to_review(&harness.service, &task).await;

    let result = harness
        .service
        .release_claim(task.id(), TransitionContext::human())
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::InvalidTransition { .. }
        ))
    ));
}

#[rstest]
#[case(ReviewPolicy::default(), &[true, true, false], false)]
#[case(ReviewPolicy::lenient(), &[true, true, false], true)]
#[case(ReviewPolicy::default(), &[true, true], true)]
#[tokio::test(flavor = "multi_thread")]
async fn record_review_applies_consensus(
    #[case] policy: ReviewPolicy,
    #[case] approvals: &[bool],
    #[case] approved: bool,
) {
    let service = TaskLifecycleService::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::new(DefaultClock),
    )
    .with_review_policy(policy);
    let task = create(&service, "Reviewed by many").await;
    drive_to_review(&service, &task).await;
    let verdicts = approvals
        .iter()
        .map(|ok| {
            if *ok {
                ReviewVerdict::approve(reviewer())
            } else {
                ReviewVerdict::reject(reviewer(), "style")
            }
        })
        .collect::<Vec<_>>();

    let outcome = service
        .record_review(task.id(), &verdicts)
        .await
        .expect("review");

    match outcome {
        ReviewOutcome::Approved(done) => {
            assert!(approved);
            assert_eq!(done.status(), TaskStatus::Completed);
        }
        ReviewOutcome::Rejected(rejection) => {
            assert!(!approved);
            assert_eq!(rejection.task().rejection_count(), 1);
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn record_review_requires_verdicts(harness: Harness) {
    let task = create(&harness.service, "Unreviewed").await;
    let result = harness.service.record_review(task.id(), &[]).await;
    assert!(matches!(result, Err(TaskLifecycleError::NoVerdicts(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_commit_is_a_status_conflict(harness: Harness) {
    let task = create(&harness.service, "Raced").await;
    harness
        .service
        .start(task.id(), coder())
        .await
        .expect("first claim wins");

    let mut stale = task.clone();
    stale
        .transition_to(TaskStatus::InProgress, &DefaultClock)
        .expect("edge is valid on the stale copy");
    let entry = AuditEntry::record(
        TransitionRecord {
            task_id: task.id(),
            actor: Actor::system("runner"),
            from_status: TaskStatus::Pending,
            to_status: TaskStatus::InProgress,
            notes: None,
            commit_sha: None,
            prior_status_since: task.created_at(),
        },
        &DefaultClock,
    );

    let result = harness
        .repository
        .commit_transition(&stale, TaskStatus::Pending, &entry, &DisputeChange::Unchanged)
        .await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::StatusConflict {
            expected: TaskStatus::Pending,
            actual: TaskStatus::InProgress,
            ..
        })
    ));
    let trail = harness.service.audit_trail(task.id()).await.expect("trail");
    assert_eq!(trail.len(), 1);
}
