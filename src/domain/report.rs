use chrono::{DateTime, FixedOffset};

use crate::domain::test_result::{Attachment, TestOutcome};

/// One flat test-case record as produced by a report parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTestCase {
    /// Dotted path ending with the fixture name.
    pub fixture_full_path: String,
    pub fixture_name: String,
    pub title: String,
    pub tags: Vec<String>,
    pub fixture_tags: Vec<String>,
    pub outcome: Option<TestOutcome>,
    pub duration_seconds: Option<String>,
    pub error_text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub cases: Vec<ParsedTestCase>,
    /// Absent in `--explore` exports, which never ran anything.
    pub start_time: Option<DateTime<FixedOffset>>,
}
