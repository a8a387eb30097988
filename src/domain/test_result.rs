use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

pub const PASSED_STATUS_ID: u8 = 1;
pub const FAILED_STATUS_ID: u8 = 5;
pub const PASSED_COMMENT: &str = "Passed via automated test.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
    Inconclusive,
    Warning,
    Other(String),
}

impl From<&str> for TestOutcome {
    fn from(value: &str) -> Self {
        match value {
            "Passed" => TestOutcome::Passed,
            "Failed" => TestOutcome::Failed,
            "Skipped" => TestOutcome::Skipped,
            "Inconclusive" => TestOutcome::Inconclusive,
            "Warning" => TestOutcome::Warning,
            other => TestOutcome::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "Passed"),
            TestOutcome::Failed => write!(f, "Failed"),
            TestOutcome::Skipped => write!(f, "Skipped"),
            TestOutcome::Inconclusive => write!(f, "Inconclusive"),
            TestOutcome::Warning => write!(f, "Warning"),
            TestOutcome::Other(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_path: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub outcome: TestOutcome,
    /// Seconds as written by the test runner, e.g. `"7.103904"`.
    pub duration_seconds: String,
    pub error_text: String,
    pub attachments: Vec<Attachment>,
}

/// One element of the `add_results_for_cases` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub case_id: u64,
    pub status_id: u8,
    pub comment: String,
    pub elapsed: String,
}

impl TestResult {
    pub fn status_id(&self) -> u8 {
        match self.outcome {
            TestOutcome::Passed => PASSED_STATUS_ID,
            _ => FAILED_STATUS_ID,
        }
    }

    pub fn comment(&self) -> String {
        match self.outcome {
            TestOutcome::Passed => PASSED_COMMENT.to_string(),
            _ => self.error_text.clone(),
        }
    }

    pub fn to_entry(&self, case_id: u64) -> Result<ResultEntry> {
        Ok(ResultEntry {
            case_id,
            status_id: self.status_id(),
            comment: self.comment(),
            elapsed: format_elapsed(&self.duration_seconds)?,
        })
    }
}

/// Rounds `duration + 0.01` up to whole seconds, so the store never records
/// a zero elapsed time.
pub fn format_elapsed(duration_seconds: &str) -> Result<String> {
    let duration = BigDecimal::from_str(duration_seconds.trim()).map_err(|e| {
        AppError::ParseError(format!("Invalid test duration '{}': {}", duration_seconds, e))
    })?;
    let margin = BigDecimal::from_str("0.01")
        .map_err(|e| AppError::Internal(format!("Invalid elapsed margin: {}", e)))?;

    let padded = duration + margin;
    let mut whole = padded.with_scale(0);
    if whole < padded {
        whole += BigDecimal::from(1);
    }
    Ok(format!("{}s", whole))
}
