//! Turns parsed report records into local test cases: tag merging, case
//! type lookup, the automated flag and title truncation.

use crate::domain::case_type::{default_case_type, TestCaseType};
use crate::domain::error::Result;
use crate::domain::report::ParsedTestCase;
use crate::domain::test_case::{truncate_title, TestCase};
use crate::domain::test_result::TestResult;

pub const AUTOMATED_TAG: &str = "automated";

/// Own tags followed by fixture tags, duplicates kept, sorted.
pub fn merge_tags(own: &[String], fixture: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = own.iter().chain(fixture).cloned().collect();
    tags.sort();
    tags
}

pub fn is_automated(tags: &[String]) -> bool {
    tags.iter().any(|tag| tag == AUTOMATED_TAG)
}

#[derive(Debug, Clone)]
pub struct CaseTypeResolver {
    types: Vec<TestCaseType>,
    default: TestCaseType,
}

impl CaseTypeResolver {
    /// Fails when the store does not flag exactly one default type.
    pub fn new(types: Vec<TestCaseType>) -> Result<Self> {
        let default = default_case_type(&types)?.clone();
        Ok(Self { types, default })
    }

    /// First sorted tag naming a known type wins, compared case-insensitively.
    pub fn resolve(&self, tags: &[String]) -> &TestCaseType {
        tags.iter()
            .find_map(|tag| {
                let tag = tag.to_lowercase();
                self.types.iter().find(|t| t.name.to_lowercase() == tag)
            })
            .unwrap_or(&self.default)
    }

    pub fn build_case(&self, parsed: &ParsedTestCase) -> TestCase {
        let tags = merge_tags(&parsed.tags, &parsed.fixture_tags);
        let type_id = self.resolve(&tags).id;

        let result = parsed.outcome.clone().map(|outcome| TestResult {
            outcome,
            duration_seconds: parsed
                .duration_seconds
                .clone()
                .unwrap_or_else(|| "0".to_string()),
            error_text: parsed.error_text.clone(),
            attachments: parsed.attachments.clone(),
        });

        TestCase {
            id: None,
            title: truncate_title(&parsed.title),
            fixture_name: parsed.fixture_name.clone(),
            fixture_full_path: parsed.fixture_full_path.clone(),
            is_automated: is_automated(&tags),
            tags,
            type_id,
            section_id: None,
            root_section_id: None,
            result,
        }
    }

    pub fn build_cases(&self, parsed: &[ParsedTestCase]) -> Vec<TestCase> {
        parsed.iter().map(|case| self.build_case(case)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::test_result::TestOutcome;

    fn types() -> Vec<TestCaseType> {
        vec![
            TestCaseType { id: 1, name: "Regression".to_string(), is_default: false },
            TestCaseType { id: 2, name: "Other".to_string(), is_default: true },
            TestCaseType { id: 3, name: "Smoke".to_string(), is_default: false },
        ]
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn parsed(title: &str, tags: &[&str], fixture_tags: &[&str]) -> ParsedTestCase {
        ParsedTestCase {
            fixture_full_path: "Specs.Features.Account.Login".to_string(),
            fixture_name: "Login".to_string(),
            title: title.to_string(),
            tags: strings(tags),
            fixture_tags: strings(fixture_tags),
            outcome: None,
            duration_seconds: None,
            error_text: String::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_resolve_matching_and_default_types() {
        let resolver = CaseTypeResolver::new(types()).unwrap();

        let smoke = merge_tags(&strings(&["smoke", "automated"]), &[]);
        assert_eq!(resolver.resolve(&smoke).name, "Smoke");

        let custom = strings(&["custom-only"]);
        assert_eq!(resolver.resolve(&custom).name, "Other");
        assert_eq!(resolver.resolve(&[]).name, "Other");
    }

    #[test]
    fn test_first_sorted_tag_wins() {
        let resolver = CaseTypeResolver::new(types()).unwrap();
        let tags = merge_tags(&strings(&["smoke"]), &strings(&["REGRESSION"]));
        assert_eq!(tags, vec!["REGRESSION", "smoke"]);
        assert_eq!(resolver.resolve(&tags).name, "Regression");
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let tags = merge_tags(&strings(&["ui", "automated"]), &strings(&["automated"]));
        assert_eq!(tags, vec!["automated", "automated", "ui"]);
    }

    #[test]
    fn test_automated_tag_is_literal() {
        assert!(is_automated(&strings(&["automated"])));
        assert!(!is_automated(&strings(&["Automated", "automation"])));
    }

    #[test]
    fn test_build_case() {
        let resolver = CaseTypeResolver::new(types()).unwrap();
        let mut record = parsed(&"t".repeat(260), &["smoke"], &["automated"]);
        record.outcome = Some(TestOutcome::Failed);
        record.duration_seconds = Some("1.5".to_string());
        record.error_text = "boom".to_string();

        let case = resolver.build_case(&record);
        assert_eq!(case.title.len(), 250);
        assert_eq!(case.type_id, 3);
        assert!(case.is_automated);
        assert_eq!(case.tags_joined(), "automated,smoke");
        assert_eq!(case.fixture_name, "Login");
        assert_eq!(case.fixture_full_path, "Specs.Features.Account.Login");

        let result = case.result.unwrap();
        assert_eq!(result.outcome, TestOutcome::Failed);
        assert_eq!(result.duration_seconds, "1.5");
        assert_eq!(result.error_text, "boom");
    }

    #[test]
    fn test_explore_records_have_no_result() {
        let resolver = CaseTypeResolver::new(types()).unwrap();
        let case = resolver.build_case(&parsed("Adds item", &[], &[]));
        assert!(case.result.is_none());
        assert!(!case.is_automated);
        assert_eq!(case.type_id, 2);
    }

    #[test]
    fn test_resolver_requires_single_default() {
        let mut no_default = types();
        no_default[1].is_default = false;
        assert!(matches!(
            CaseTypeResolver::new(no_default),
            Err(AppError::ConfigError(_))
        ));
    }
}
