/// End-to-end submission tests
///
/// A fake execution service is served with axum on an ephemeral port and the
/// real reqwest-backed client talks to it over HTTP.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use testportal_common::languages::LanguageRegistry;
use testportal_session::{
    HttpExecutionClient, Outcome, SessionStore, SubmissionOrchestrator, SubmissionState,
    TestCaseField,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

/// Serve `router` on 127.0.0.1 and return its base URL
async fn spawn_service(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Fake service answering every request with `status` and `reply`
fn recording_service(recorded: Recorded, status: StatusCode, reply: &'static str) -> Router {
    Router::new()
        .route(
            "/execute",
            post(
                move |State(recorded): State<Recorded>, headers: HeaderMap, body: Bytes| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    recorded.content_types.lock().unwrap().push(content_type);
                    let value: Value = serde_json::from_slice(&body).unwrap();
                    recorded.bodies.lock().unwrap().push(value);
                    (status, [("content-type", "application/json")], reply)
                },
            ),
        )
        .with_state(recorded)
}

fn orchestrator_for(base_url: &str) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(Arc::new(HttpExecutionClient::new(base_url)))
}

fn new_store() -> SessionStore {
    SessionStore::new(LanguageRegistry::builtin())
}

#[tokio::test]
async fn test_successful_submission_round_trip() {
    let recorded = Recorded::default();
    let base_url = spawn_service(recording_service(
        recorded.clone(),
        StatusCode::OK,
        r#"{"passed": true}"#,
    ))
    .await;
    let orchestrator = orchestrator_for(&base_url);
    let mut store = new_store();

    let ticket = store.begin_submission();
    let outcome = orchestrator.submit(&ticket.snapshot).await;
    assert!(store.settle_submission(ticket.id, outcome));

    assert_eq!(
        store.submission().outcome(),
        Some(&Outcome::Success { status: 200, body: json!({ "passed": true }) })
    );
    assert_eq!(
        recorded.bodies.lock().unwrap().clone(),
        vec![json!({
            "code": "print(input())",
            "language": "python",
            "tests": [{ "input": "hello", "expected_output": "hello" }]
        })]
    );
    assert_eq!(
        recorded.content_types.lock().unwrap().clone(),
        vec!["application/json".to_string()]
    );
}

#[tokio::test]
async fn test_validation_error_is_not_transport_failure() {
    let recorded = Recorded::default();
    let base_url = spawn_service(recording_service(
        recorded,
        StatusCode::BAD_REQUEST,
        r#"{"error": "syntax error"}"#,
    ))
    .await;
    let orchestrator = orchestrator_for(&base_url);
    let mut store = new_store();

    let ticket = store.begin_submission();
    let outcome = orchestrator.submit(&ticket.snapshot).await;

    assert_eq!(
        outcome,
        Outcome::Success { status: 400, body: json!({ "error": "syntax error" }) }
    );
    assert_eq!(
        outcome.to_json(),
        json!({ "status": 400, "body": { "error": "syntax error" } })
    );
}

#[tokio::test]
async fn test_server_error_passes_through() {
    let base_url = spawn_service(recording_service(
        Recorded::default(),
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"detail": "execution error"}"#,
    ))
    .await;

    let outcome = orchestrator_for(&base_url)
        .submit(&new_store().begin_submission().snapshot)
        .await;

    assert_eq!(
        outcome,
        Outcome::Success { status: 500, body: json!({ "detail": "execution error" }) }
    );
}

#[tokio::test]
async fn test_unreachable_service() {
    // Bind then release a port so nothing is listening on it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let orchestrator = orchestrator_for(&format!("http://{}", addr));
    let mut store = new_store();
    let ticket = store.begin_submission();
    let outcome = orchestrator.submit(&ticket.snapshot).await;
    assert!(store.settle_submission(ticket.id, outcome));

    let outcome = store.submission().outcome().unwrap();
    match outcome {
        Outcome::TransportFailure { message } => assert!(!message.is_empty()),
        other => panic!("expected transport failure, got {:?}", other),
    }
    let shown = outcome.to_json();
    assert!(shown["error"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(shown.get("status").is_none());

    // the trigger is available again after a failure
    assert!(store.try_begin_submission().is_some());
}

#[tokio::test]
async fn test_unparsable_body_is_transport_failure() {
    let base_url = spawn_service(recording_service(
        Recorded::default(),
        StatusCode::OK,
        "<html>gateway</html>",
    ))
    .await;

    let outcome = orchestrator_for(&base_url)
        .submit(&new_store().begin_submission().snapshot)
        .await;

    assert!(outcome.is_transport_failure());
}

#[tokio::test]
async fn test_request_carries_snapshot_not_later_edits() {
    let recorded = Recorded::default();
    let base_url = spawn_service(recording_service(
        recorded.clone(),
        StatusCode::OK,
        r#"{"compile_success": true, "tests": []}"#,
    ))
    .await;
    let orchestrator = orchestrator_for(&base_url);
    let mut store = new_store();
    store.set_language("java").unwrap();
    store.set_code("class Main {}");

    let ticket = store.begin_submission();
    let id = ticket.id;
    let (tx, mut rx) = mpsc::unbounded_channel();
    orchestrator.dispatch(ticket, tx);

    store.set_code("class Main { /* edited */ }");
    store.set_test_case_field(0, TestCaseField::Input, "edited");

    let settlement = rx.recv().await.unwrap();
    assert_eq!(settlement.id, id);
    assert!(store.settle_submission(settlement.id, settlement.outcome));
    assert!(matches!(store.submission(), SubmissionState::Settled { .. }));

    let bodies = recorded.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["code"], "class Main {}");
    assert_eq!(bodies[0]["language"], "java");
    assert_eq!(bodies[0]["tests"][0]["input"], "hello");
}

#[tokio::test]
async fn test_identical_snapshots_issue_two_requests() {
    let recorded = Recorded::default();
    let base_url = spawn_service(recording_service(
        recorded.clone(),
        StatusCode::OK,
        r#"{"passed": true}"#,
    ))
    .await;
    let orchestrator = orchestrator_for(&base_url);
    let snapshot = new_store().begin_submission().snapshot;

    let (first, second) = tokio::join!(orchestrator.submit(&snapshot), orchestrator.submit(&snapshot));

    assert_eq!(first, second);
    assert_eq!(recorded.bodies.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_elapsed_timeout_is_transport_failure() {
    let slow = Router::new().route(
        "/execute",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, [("content-type", "application/json")], r#"{"passed": true}"#)
        }),
    );
    let base_url = spawn_service(slow).await;
    let client = HttpExecutionClient::new(&base_url).with_timeout(Duration::from_millis(200));
    let orchestrator = SubmissionOrchestrator::new(Arc::new(client));

    let started = Instant::now();
    let outcome = orchestrator
        .submit(&new_store().begin_submission().snapshot)
        .await;

    assert!(started.elapsed() < Duration::from_secs(3));
    match outcome {
        Outcome::TransportFailure { message } => {
            assert!(message.contains("/execute"));
            assert!(message.to_lowercase().contains("timed out"), "message: {}", message);
        }
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refused_connection_names_the_cause() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = orchestrator_for(&format!("http://{}", addr))
        .submit(&new_store().begin_submission().snapshot)
        .await;

    match outcome {
        // reqwest's top-level text alone is just "error sending request for url"
        Outcome::TransportFailure { message } => {
            let (_, causes) = message.split_once("error sending request for url").unwrap();
            assert!(causes.contains(": "), "message: {}", message);
        }
        other => panic!("expected transport failure, got {:?}", other),
    }
}
