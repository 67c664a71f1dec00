/// Execution Report - Reading the Service's Result Payload
///
/// The client passes response bodies through untouched. This module is the
/// optional second look the result panel takes: it decodes the payload the
/// execution service documents for a successful run and classifies the
/// exchange by status and body together.
///
/// **Classification Rules:**
/// - 2xx with a decodable report: `Report`
/// - 4xx: `Rejected` (bad language, schema violation, ...)
/// - 5xx: `ServiceError`
/// - Anything else: `Unrecognized`

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub stdout: String,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub time_seconds: Option<f64>,
    #[serde(default)]
    pub memory_kb: Option<u64>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub compile_success: bool,
    #[serde(default)]
    pub compile_output: Option<String>,
    pub tests: Vec<TestReport>,
}

impl ExecutionReport {
    pub fn passed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.compile_success && self.tests.iter().all(|t| t.passed)
    }

    pub fn summary(&self) -> String {
        if !self.compile_success {
            return "Compilation failed".to_string();
        }
        format!("{}/{} tests passed", self.passed_count(), self.tests.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Report(ExecutionReport),
    Rejected { status: u16, detail: String },
    ServiceError { status: u16, detail: String },
    Unrecognized { status: u16 },
}

impl Verdict {
    pub fn classify(status: u16, body: &Value) -> Self {
        match status {
            200..=299 => match serde_json::from_value::<ExecutionReport>(body.clone()) {
                Ok(report) => Verdict::Report(report),
                Err(_) => Verdict::Unrecognized { status },
            },
            400..=499 => Verdict::Rejected {
                status,
                detail: error_detail(body),
            },
            500..=599 => Verdict::ServiceError {
                status,
                detail: error_detail(body),
            },
            _ => Verdict::Unrecognized { status },
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Verdict::Report(report) => report.summary(),
            Verdict::Rejected { status, detail } => format!("Rejected ({}): {}", status, detail),
            Verdict::ServiceError { status, detail } => format!("Service error ({}): {}", status, detail),
            Verdict::Unrecognized { status } => format!("HTTP {}", status),
        }
    }
}

/// Pull a human-readable message out of an error body.
/// Structured details (e.g. a list of validation errors) are kept as compact JSON.
fn error_detail(body: &Value) -> String {
    let field = body.get("detail").or_else(|| body.get("error"));
    match field {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}
