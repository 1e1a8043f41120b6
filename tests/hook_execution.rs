//! End-to-end hook execution against real subprocesses and an HTTP sink.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use gantry::hook::{
    adapters::{
        script::ScriptRunner, system::SystemHookExecutor, webhook::HOOK_EVENT_HEADER,
        webhook::WebhookSender, which::WhichLocator,
    },
    domain::{HookConfig, HookEvent, HookExecutionError, HookPayload, HookSettings},
    services::HookOrchestrator,
};
use gantry::project::ProjectPath;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

type Orchestrator = HookOrchestrator<SystemHookExecutor, WhichLocator>;

#[fixture]
fn workdir() -> TempDir {
    tempfile::tempdir().expect("create hook working directory")
}

fn orchestrator(hooks: &[HookConfig], workdir: &TempDir, timeout_secs: u64) -> Orchestrator {
    let executor = SystemHookExecutor::new(
        ScriptRunner::new().with_working_directory(workdir.path()),
        WebhookSender::new(),
    );
    HookOrchestrator::new(hooks, &[], Arc::new(executor), Arc::new(WhichLocator)).with_settings(
        HookSettings {
            timeout_secs,
            ..HookSettings::default()
        },
    )
}

fn completed_payload() -> HookPayload {
    HookPayload::new(HookEvent::TaskCompleted, DefaultClock.utc())
        .with_project(ProjectPath::new("/work/app").expect("valid project path"))
        .with_data(json!({ "title": "Add parser" }))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn script_receives_payload_on_stdin_and_env(workdir: TempDir) {
    let hooks = [HookConfig::script(
        "capture",
        "task.completed",
        r#"cat > payload.json && printf '%s' "$GANTRY_HOOK_EVENT" > event.txt"#,
    )];
    let report = orchestrator(&hooks, &workdir, 10)
        .execute_hooks_for_event(&completed_payload())
        .await;

    assert!(report.all_succeeded(), "{report:?}");
    let payload: Value = serde_json::from_str(
        &std::fs::read_to_string(workdir.path().join("payload.json")).expect("payload written"),
    )
    .expect("payload is JSON");
    assert_eq!(payload.get("event"), Some(&json!("task.completed")));
    assert_eq!(payload.get("project"), Some(&json!("/work/app")));
    assert_eq!(
        payload.pointer("/data/title"),
        Some(&json!("Add parser"))
    );
    assert_eq!(
        std::fs::read_to_string(workdir.path().join("event.txt")).expect("event written"),
        "task.completed"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_zero_exit_reports_code_and_stderr(workdir: TempDir) {
    let hooks = [HookConfig::script(
        "broken",
        "task.completed",
        "echo 'deploy key missing' >&2; exit 3",
    )];
    let report = orchestrator(&hooks, &workdir, 10)
        .execute_hooks_for_event(&completed_payload())
        .await;

    let error = report
        .results
        .first()
        .and_then(|result| result.error.clone())
        .expect("hook failed");
    assert_eq!(
        error,
        HookExecutionError::NonZeroExit {
            code: Some(3),
            stderr: "deploy key missing".to_owned(),
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hung_script_is_killed_at_timeout_and_siblings_still_run(workdir: TempDir) {
    let hooks = [
        HookConfig::script("hung", "task.completed", "sleep 30"),
        HookConfig::script("after", "task.completed", "touch after.txt"),
    ];
    let started = Instant::now();
    let report = orchestrator(&hooks, &workdir, 1)
        .execute_hooks_for_event(&completed_payload())
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    let outcomes: Vec<(&str, bool)> = report
        .results
        .iter()
        .map(|result| (result.hook_name.as_str(), result.success))
        .collect();
    assert_eq!(outcomes, vec![("hung", false), ("after", true)]);
    assert!(matches!(
        report.results.first().and_then(|result| result.error.clone()),
        Some(HookExecutionError::TimedOut(_))
    ));
    assert!(workdir.path().join("after.txt").exists());
}

#[derive(Clone, Default)]
struct Sink {
    received: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Sink {
    fn received(&self) -> Vec<(Option<String>, Value)> {
        self.received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

async fn accept(State(sink): State<Sink>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    let event = headers
        .get(HOOK_EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    sink.received
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push((event, body));
    StatusCode::NO_CONTENT
}

async fn reject() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn stall() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(30)).await;
    StatusCode::OK
}

async fn serve_sink() -> (SocketAddr, Sink) {
    let sink = Sink::default();
    let app = Router::new()
        .route("/hook", post(accept))
        .route("/down", post(reject))
        .route("/slow", post(stall))
        .with_state(sink.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind webhook sink");
    let addr = listener.local_addr().expect("sink address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve webhook sink");
    });
    (addr, sink)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn webhook_posts_payload_and_classifies_failures(workdir: TempDir) {
    let (addr, sink) = serve_sink().await;
    let hooks = [
        HookConfig::webhook("notify", "task.completed", format!("http://{addr}/hook")),
        HookConfig::webhook("down", "task.completed", format!("http://{addr}/down")),
        HookConfig::webhook("slow", "task.completed", format!("http://{addr}/slow")),
    ];

    let report = orchestrator(&hooks, &workdir, 1)
        .execute_hooks_for_event(&completed_payload())
        .await;

    let errors: Vec<Option<HookExecutionError>> = report
        .results
        .iter()
        .map(|result| result.error.clone())
        .collect();
    assert_eq!(
        errors,
        vec![
            None,
            Some(HookExecutionError::Status(503)),
            Some(HookExecutionError::TimedOut(Duration::from_secs(1))),
        ]
    );
    let received = sink.received();
    assert_eq!(received.len(), 1);
    let (event, body) = received.first().expect("one delivery");
    assert_eq!(event.as_deref(), Some("task.completed"));
    assert_eq!(body.get("version"), Some(&json!(1)));
    assert_eq!(body.pointer("/data/title"), Some(&json!("Add parser")));
}
