// Terminal rendering of the session and its result panel

use testportal_common::report::Verdict;
use testportal_session::{Outcome, SessionStore, StoreEvent, SubmissionState, TestCaseField};

pub const NO_RESULT: &str = "No result yet";
pub const RUNNING: &str = "Running...";

/// Pretty-printed `{status, body}` / `{error}`, plus a one-line verdict for completed exchanges
pub fn result_panel(state: &SubmissionState) -> String {
    match state {
        SubmissionState::Idle => NO_RESULT.to_string(),
        SubmissionState::Pending { .. } => RUNNING.to_string(),
        SubmissionState::Settled { outcome, .. } => {
            let json = serde_json::to_string_pretty(&outcome.to_json())
                .unwrap_or_else(|e| format!("{{\"error\": \"unrenderable result: {}\"}}", e));
            match outcome {
                Outcome::Success { status, body } => {
                    format!("{}\n{}", json, Verdict::classify(*status, body).summary())
                }
                Outcome::TransportFailure { .. } => json,
            }
        }
    }
}

/// Full view of the document
pub fn session_view(store: &SessionStore) -> String {
    let doc = store.document();
    let label = store
        .languages()
        .label(&doc.language)
        .unwrap_or(doc.language.as_str());

    let mut out = String::new();
    out.push_str(&format!("Language: {}\n", label));
    out.push_str("Code:\n");
    for line in doc.code.lines() {
        out.push_str(&format!("  | {}\n", line));
    }
    out.push_str("Tests:\n");
    for (i, tc) in doc.test_cases.iter().enumerate() {
        out.push_str(&format!(
            "  [{}] input={:?} expected={:?}\n",
            i, tc.input, tc.expected_output
        ));
    }
    out.push_str(&format!("Run: {}\n", if store.is_pending() { RUNNING } else { "ready" }));
    out.push_str("Result:\n");
    out.push_str(&result_panel(store.submission()));
    out
}

/// One line acknowledging a store mutation
pub fn event_line(event: &StoreEvent, store: &SessionStore) -> String {
    let doc = store.document();
    match event {
        StoreEvent::CodeChanged => format!("code: {} line(s)", doc.code.lines().count()),
        StoreEvent::LanguageChanged => format!("language: {}", doc.language),
        StoreEvent::TestCaseChanged { index, field } => {
            let tc = &doc.test_cases[*index];
            match field {
                TestCaseField::Input => format!("test [{}] input={:?}", index, tc.input),
                TestCaseField::ExpectedOutput => {
                    format!("test [{}] expected={:?}", index, tc.expected_output)
                }
            }
        }
        StoreEvent::TestCaseAdded { index } => format!("test [{}] added ({} total)", index, doc.test_cases.len()),
        StoreEvent::SubmissionStarted { id } => format!("submission {}: {}", id, RUNNING),
        StoreEvent::SubmissionSettled { .. } => result_panel(store.submission()),
    }
}

/// Observer printing every store mutation to stdout
pub fn attach_printer(store: &mut SessionStore) {
    store.subscribe(|event, store| println!("{}", event_line(event, store)));
}
