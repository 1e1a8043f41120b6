//! Unit tests for task domain values.

use crate::project::{ProjectPath, Role};
use crate::task::domain::{
    Actor, AuditEntry, CommitSha, Dispute, DisputeKind, DisputeStatus, NewTask,
    OpenDisputeParams, ReviewConsensus, ReviewVerdict, SectionRef, Task, TaskDomainError,
    TaskStatus, TransitionRecord,
};
use chrono::Duration;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        project: ProjectPath::new("/work/app").expect("valid project path"),
        title: title.to_owned(),
        section: None,
        source_file: Some("  ".to_owned()),
    }
}

#[rstest]
fn task_new_starts_pending_with_trimmed_title(clock: DefaultClock) {
    let task = Task::new(new_task("  Add parser  "), &clock).expect("valid task");

    assert_eq!(task.status(), TaskStatus::Pending);
    assert_eq!(task.title(), "Add parser");
    assert_eq!(task.rejection_count(), 0);
    assert_eq!(task.source_file(), None);
    assert_eq!(task.created_at(), task.updated_at());
}

#[rstest]
fn task_new_rejects_blank_title(clock: DefaultClock) {
    assert_eq!(
        Task::new(new_task("   "), &clock),
        Err(TaskDomainError::EmptyTitle)
    );
}

#[rstest]
#[case("abc1234", true)]
#[case("ABCDEF0123456789abcdef0123456789abcdef01", true)]
#[case("abc12", false)]
#[case("xyz1234", false)]
fn commit_sha_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(CommitSha::new(raw).is_ok(), valid);
}

#[rstest]
fn section_names_must_not_be_blank() {
    assert_eq!(
        SectionRef::new(" ", 1),
        Err(TaskDomainError::EmptySectionName)
    );
}

#[rstest]
fn audit_entry_measures_time_in_prior_status(clock: DefaultClock) {
    let task = Task::new(new_task("Measure"), &clock).expect("valid task");
    let since = task.created_at() - Duration::seconds(90);

    let entry = AuditEntry::record(
        TransitionRecord {
            task_id: task.id(),
            actor: Actor::system("runner"),
            from_status: TaskStatus::Pending,
            to_status: TaskStatus::InProgress,
            notes: Some("   ".to_owned()),
            commit_sha: None,
            prior_status_since: since,
        },
        &clock,
    );

    assert!(entry.time_in_prior_status_ms() >= 90_000);
    assert_eq!(entry.notes(), None);
}

#[rstest]
fn audit_entry_clamps_future_prior_timestamp(clock: DefaultClock) {
    let task = Task::new(new_task("Clamp"), &clock).expect("valid task");

    let entry = AuditEntry::record(
        TransitionRecord {
            task_id: task.id(),
            actor: Actor::Human,
            from_status: TaskStatus::Pending,
            to_status: TaskStatus::Skipped,
            notes: None,
            commit_sha: None,
            prior_status_since: task.created_at() + Duration::hours(1),
        },
        &clock,
    );

    assert_eq!(entry.time_in_prior_status_ms(), 0);
}

#[rstest]
fn dispute_resolves_once(clock: DefaultClock) {
    let task = Task::new(new_task("Dispute"), &clock).expect("valid task");
    let mut dispute = Dispute::open(
        OpenDisputeParams {
            task_id: task.id(),
            kind: DisputeKind::RepeatedRejection,
            reason: "rejected 3 times".to_owned(),
            coder_position: None,
            reviewer_position: Some("missing tests".to_owned()),
        },
        &clock,
    );
    assert_eq!(dispute.status(), DisputeStatus::Open);

    dispute
        .resolve(Some("add the tests".to_owned()), &clock)
        .expect("first resolve succeeds");
    assert_eq!(dispute.status(), DisputeStatus::Resolved);
    assert_eq!(dispute.resolution_notes(), Some("add the tests"));
    assert!(dispute.resolved_at().is_some());

    assert_eq!(
        dispute.resolve(None, &clock),
        Err(TaskDomainError::DisputeAlreadyResolved(dispute.id()))
    );
}

fn verdicts(approvals: &[bool]) -> Vec<ReviewVerdict> {
    approvals
        .iter()
        .map(|approved| {
            let reviewer = Actor::agent(Role::Reviewer, "codex", "o3");
            if *approved {
                ReviewVerdict::approve(reviewer)
            } else {
                ReviewVerdict::reject(reviewer, "needs work")
            }
        })
        .collect()
}

#[rstest]
#[case(ReviewConsensus::All, &[true, true], true)]
#[case(ReviewConsensus::All, &[true, false], false)]
#[case(ReviewConsensus::Majority, &[true, true, false], true)]
#[case(ReviewConsensus::Majority, &[true, false], false)]
#[case(ReviewConsensus::Majority, &[], false)]
#[case(ReviewConsensus::All, &[], false)]
fn consensus_rules(
    #[case] consensus: ReviewConsensus,
    #[case] approvals: &[bool],
    #[case] expected: bool,
) {
    assert_eq!(consensus.is_reached(&verdicts(approvals)), expected);
}

#[rstest]
fn actor_serializes_with_kind_tag() {
    let actor = Actor::agent(Role::Coder, "claude", "opus");
    let json = serde_json::to_value(&actor).expect("serializable actor");
    assert_eq!(json["kind"], "agent");
    assert_eq!(json["role"], "coder");
    assert_eq!(actor.to_string(), "coder (claude/opus)");
}
