/// Session State Store
///
/// **Responsibility:**
/// Single owner of the editable document (code, language, test cases) and of
/// the lifecycle of the most recent submission. Every mutation is reported to
/// subscribed observers synchronously, before the mutating call returns.
///
/// **Submission Lifecycle:**
/// - `Idle` until the first submission
/// - `begin_submission()` moves to `Pending` and hands out an owned snapshot
/// - `settle_submission()` moves to `Settled` only for the most recent id;
///   anything older is discarded as stale

use chrono::Utc;
use testportal_common::languages::{Language, LanguageRegistry};
use testportal_common::types::{ExecuteRequest, TestCase};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::outcome::{Outcome, SubmissionId, SubmissionState};

const SEED_CODE: &str = "print(input())";
const SEED_INPUT: &str = "hello";
const SEED_EXPECTED: &str = "hello";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
}

/// Which half of a test case an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCaseField {
    Input,
    ExpectedOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDocument {
    pub code: String,
    pub language: Language,
    pub test_cases: Vec<TestCase>,
}

impl SessionDocument {
    /// Wire form for `POST /execute`. Fields are copied verbatim.
    pub fn to_request(&self) -> ExecuteRequest {
        ExecuteRequest {
            code: self.code.clone(),
            language: self.language.to_string(),
            tests: self.test_cases.clone(),
        }
    }
}

/// Handed out by `begin_submission`. The document is an owned copy, so later
/// edits to the store never reach an in-flight request.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub id: SubmissionId,
    pub snapshot: SessionDocument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CodeChanged,
    LanguageChanged,
    TestCaseChanged { index: usize, field: TestCaseField },
    TestCaseAdded { index: usize },
    SubmissionStarted { id: SubmissionId },
    SubmissionSettled { id: SubmissionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub type Observer = Box<dyn Fn(&StoreEvent, &SessionStore)>;

pub struct SessionStore {
    session_id: Uuid,
    languages: LanguageRegistry,
    document: SessionDocument,
    submission: SubmissionState,
    last_submission: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl SessionStore {
    /// New session seeded with a runnable example and one test case
    pub fn new(languages: LanguageRegistry) -> Self {
        let document = SessionDocument {
            code: SEED_CODE.to_string(),
            language: languages.default_language(),
            test_cases: vec![TestCase::new(SEED_INPUT, SEED_EXPECTED)],
        };
        Self::with_document(languages, document)
    }

    /// New session around an existing document.
    ///
    /// # Panics
    /// If `document` has no test cases.
    pub fn with_document(languages: LanguageRegistry, document: SessionDocument) -> Self {
        assert!(
            !document.test_cases.is_empty(),
            "a session starts with at least one test case"
        );
        let session_id = Uuid::new_v4();
        debug!(session_id = %session_id, language = %document.language, "Session created");
        Self {
            session_id,
            languages,
            document,
            submission: SubmissionState::Idle,
            last_submission: 0,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn document(&self) -> &SessionDocument {
        &self.document
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn is_pending(&self) -> bool {
        self.submission.is_pending()
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent, &SessionStore) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn notify(&self, event: StoreEvent) {
        for (_, observer) in &self.observers {
            observer(&event, self);
        }
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.document.code = code.into();
        debug!(session_id = %self.session_id, code_len = self.document.code.len(), "Code updated");
        self.notify(StoreEvent::CodeChanged);
    }

    /// Select a language from the configured set
    pub fn set_language(&mut self, name: &str) -> Result<(), SessionError> {
        let language = self
            .languages
            .resolve(name)
            .ok_or_else(|| SessionError::UnknownLanguage(name.to_string()))?;

        debug!(session_id = %self.session_id, language = %language, "Language updated");
        self.document.language = language;
        self.notify(StoreEvent::LanguageChanged);
        Ok(())
    }

    /// # Panics
    /// If `index` does not name an existing test case.
    pub fn set_test_case_field(&mut self, index: usize, field: TestCaseField, value: impl Into<String>) {
        let count = self.document.test_cases.len();
        let Some(test_case) = self.document.test_cases.get_mut(index) else {
            panic!("test case index {} out of range ({} test cases)", index, count);
        };

        match field {
            TestCaseField::Input => test_case.input = value.into(),
            TestCaseField::ExpectedOutput => test_case.expected_output = value.into(),
        }

        debug!(session_id = %self.session_id, index, field = ?field, "Test case updated");
        self.notify(StoreEvent::TestCaseChanged { index, field });
    }

    /// Append a blank test case and return its index
    pub fn add_test_case(&mut self) -> usize {
        self.document.test_cases.push(TestCase::blank());
        let index = self.document.test_cases.len() - 1;
        debug!(session_id = %self.session_id, index, "Test case added");
        self.notify(StoreEvent::TestCaseAdded { index });
        index
    }

    /// Start a new submission cycle from any state.
    /// Any submission still in flight is superseded.
    pub fn begin_submission(&mut self) -> SubmissionTicket {
        if let SubmissionState::Pending { id } = self.submission {
            warn!(session_id = %self.session_id, superseded = %id, "Submission superseded while pending");
        }

        self.last_submission += 1;
        let id = SubmissionId(self.last_submission);
        self.submission = SubmissionState::Pending { id };

        let ticket = SubmissionTicket {
            id,
            snapshot: self.document.clone(),
        };

        info!(
            session_id = %self.session_id,
            submission = %id,
            language = %ticket.snapshot.language,
            test_cases = ticket.snapshot.test_cases.len(),
            "Submission started"
        );
        self.notify(StoreEvent::SubmissionStarted { id });
        ticket
    }

    /// `begin_submission`, unless one is already pending
    pub fn try_begin_submission(&mut self) -> Option<SubmissionTicket> {
        if self.is_pending() {
            return None;
        }
        Some(self.begin_submission())
    }

    /// Record the outcome of submission `id`.
    ///
    /// Returns `false` and leaves the state untouched when `id` is not the
    /// submission currently pending: it was superseded, or already settled.
    pub fn settle_submission(&mut self, id: SubmissionId, outcome: Outcome) -> bool {
        match self.submission {
            SubmissionState::Pending { id: pending } if pending == id => {}
            _ => {
                warn!(
                    session_id = %self.session_id,
                    submission = %id,
                    latest = self.last_submission,
                    "Discarding stale settlement"
                );
                return false;
            }
        }

        match &outcome {
            Outcome::Success { status, .. } => {
                info!(session_id = %self.session_id, submission = %id, status, "Submission settled")
            }
            Outcome::TransportFailure { message } => {
                warn!(session_id = %self.session_id, submission = %id, error = %message, "Submission failed")
            }
        }

        self.submission = SubmissionState::Settled {
            id,
            outcome,
            settled_at: Utc::now(),
        };
        self.notify(StoreEvent::SubmissionSettled { id });
        true
    }
}
