use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::test_result::TestResult;

/// TestRail rejects titles longer than this.
pub const TITLE_MAX_CHARS: usize = 250;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    pub id: Option<u64>,
    pub title: String,
    /// Fixture display name for local cases; the owning section's name for
    /// cases fetched from the store.
    pub fixture_name: String,
    /// Dotted path ending with the fixture name, e.g. `Specs.Features.Account.Login`.
    pub fixture_full_path: String,
    /// Sorted, duplicates kept.
    pub tags: Vec<String>,
    pub type_id: u64,
    pub is_automated: bool,
    pub section_id: Option<u64>,
    pub root_section_id: Option<u64>,
    pub result: Option<TestResult>,
}

/// Request body shared by `add_case` and `update_case`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasePayload {
    pub title: String,
    pub type_id: u64,
    pub custom_is_automated: bool,
}

impl TestCase {
    /// Key used to pair local and remote cases: section name followed by title.
    pub fn identity_key(&self) -> String {
        format!("{}{}", self.fixture_name, self.title)
    }

    /// Only the persisted attributes count; a changed title alone is not an update.
    pub fn matches_other(&self, other: &TestCase) -> bool {
        self.is_automated == other.is_automated && self.type_id == other.type_id
    }

    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }

    pub fn to_payload(&self) -> CasePayload {
        CasePayload {
            title: self.title.clone(),
            type_id: self.type_id,
            custom_is_automated: self.is_automated,
        }
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TestCase => Title: '{}' | FixtureName: '{}' | IsAutomated: '{}' | ID: '{:?}'",
            self.title, self.fixture_name, self.is_automated, self.id
        )
    }
}

/// Cuts a title to [`TITLE_MAX_CHARS`] characters without any marker.
pub fn truncate_title(title: &str) -> String {
    title.chars().take(TITLE_MAX_CHARS).collect()
}
