use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Monotonically increasing per-session submission identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Terminal result of one submission cycle.
///
/// Serializes to the two shapes the result panel shows:
/// `{"status": 200, "body": {...}}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// A completed HTTP exchange, whatever the status code
    Success { status: u16, body: Value },
    TransportFailure {
        #[serde(rename = "error")]
        message: String,
    },
}

impl Outcome {
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Outcome::TransportFailure { .. })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Outcome::Success { status, body } => serde_json::json!({ "status": status, "body": body }),
            Outcome::TransportFailure { message } => serde_json::json!({ "error": message }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending { id: SubmissionId },
    Settled {
        id: SubmissionId,
        outcome: Outcome,
        settled_at: DateTime<Utc>,
    },
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending { .. })
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            SubmissionState::Settled { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}
