use serde::{Deserialize, Serialize};

/// One input/expected-output pair, in the order it will be executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }

    /// Blank entry appended by "add test"
    pub fn blank() -> Self {
        Self::default()
    }
}

/// Body of `POST /execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    pub language: String,
    pub tests: Vec<TestCase>,
}

/// Path of the execution endpoint, relative to the configured base URL
pub const EXECUTE_PATH: &str = "/execute";

/// Join the configured base URL with the execution endpoint
pub fn execute_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), EXECUTE_PATH)
}
