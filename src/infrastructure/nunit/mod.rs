//! NUnit3 XML report reader.
//!
//! Works on both `nunit3-console --explore` exports (no outcomes) and
//! result files. Only `TestFixture` suites are read; each yields its plain
//! test cases plus the cases of its `ParameterizedMethod` suites.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use roxmltree::{Document, Node};

use crate::domain::error::{AppError, Result};
use crate::domain::report::{ParsedTestCase, TestReport};
use crate::domain::test_result::{Attachment, TestOutcome};

pub fn parse_report_file(path: &Path) -> Result<TestReport> {
    let xml = std::fs::read_to_string(path).map_err(|e| {
        AppError::IoError(format!("Failed to read NUnit file {}: {}", path.display(), e))
    })?;
    parse_report(&xml)
}

pub fn parse_report(xml: &str) -> Result<TestReport> {
    let doc = Document::parse(xml)
        .map_err(|e| AppError::ParseError(format!("Invalid NUnit XML: {}", e)))?;

    let mut cases = Vec::new();
    let fixtures = doc
        .descendants()
        .filter(|node| is_suite_of_type(node, "TestFixture"));

    for fixture in fixtures {
        let fixture = FixtureInfo::read(&fixture)?;

        for case_node in element_children(&fixture.node, "test-case") {
            cases.push(read_case(&fixture, &case_node, Vec::new())?);
        }

        for method in element_children(&fixture.node, "test-suite")
            .filter(|node| node.attribute("type") == Some("ParameterizedMethod"))
        {
            let method_tags = properties(&method, "Category");
            for case_node in element_children(&method, "test-case") {
                cases.push(read_case(&fixture, &case_node, method_tags.clone())?);
            }
        }
    }

    let root = doc.root_element();
    let start_time = if root.has_tag_name("test-run") {
        root.attribute("start-time").map(parse_start_time).transpose()?
    } else {
        None
    };

    Ok(TestReport { cases, start_time })
}

struct FixtureInfo<'a, 'input> {
    node: Node<'a, 'input>,
    display_name: String,
    full_path: String,
    tags: Vec<String>,
}

impl<'a, 'input> FixtureInfo<'a, 'input> {
    fn read(node: &Node<'a, 'input>) -> Result<Self> {
        let name = node
            .attribute("name")
            .ok_or_else(|| AppError::ParseError("Test fixture without a name".to_string()))?;
        let full_name = node.attribute("fullname").unwrap_or(name);

        // A Description property replaces the class name as the section title.
        let display_name = properties(node, "Description")
            .into_iter()
            .map(|description| section_title(&description))
            .find(|title| !title.is_empty())
            .unwrap_or_else(|| section_title(name));

        let namespace = if full_name == name {
            ""
        } else {
            full_name
                .strip_suffix(name)
                .and_then(|rest| rest.strip_suffix('.'))
                .unwrap_or(full_name)
        };
        let full_path = if namespace.is_empty() {
            display_name.clone()
        } else {
            format!("{}.{}", namespace, display_name)
        };

        Ok(Self {
            node: *node,
            display_name,
            full_path,
            tags: properties(node, "Category"),
        })
    }
}

/// `inherited` carries the categories of an enclosing parameterized method.
fn read_case(
    fixture: &FixtureInfo,
    node: &Node,
    inherited: Vec<String>,
) -> Result<ParsedTestCase> {
    let title = node
        .attribute("name")
        .ok_or_else(|| {
            AppError::ParseError(format!(
                "Test case without a name in fixture '{}'",
                fixture.full_path
            ))
        })?
        .to_string();

    let mut tags = inherited;
    tags.extend(properties(node, "Category"));

    let error_text = element_children(node, "failure")
        .next()
        .and_then(|failure| element_children(&failure, "message").next())
        .and_then(|message| message.text())
        .unwrap_or_default()
        .to_string();

    let mut attachments = Vec::new();
    if let Some(list) = element_children(node, "attachments").next() {
        for attachment in element_children(&list, "attachment") {
            let file_path = child_text(&attachment, "filePath").ok_or_else(|| {
                AppError::ParseError(format!("Attachment without filePath on test '{}'", title))
            })?;
            attachments.push(Attachment {
                file_path,
                description: child_text(&attachment, "description").unwrap_or_default(),
            });
        }
    }

    Ok(ParsedTestCase {
        fixture_full_path: fixture.full_path.clone(),
        fixture_name: fixture.display_name.clone(),
        title,
        tags,
        fixture_tags: fixture.tags.clone(),
        outcome: node.attribute("result").map(TestOutcome::from),
        duration_seconds: node.attribute("duration").map(str::to_string),
        error_text,
        attachments,
    })
}

/// Dots separate path segments, so a fixture title keeps none of its own.
/// Trailing periods are dropped and inner ones become underscores.
fn section_title(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('.')
        .trim_end()
        .replace('.', "_")
}

fn is_suite_of_type(node: &Node, suite_type: &str) -> bool {
    node.has_tag_name("test-suite") && node.attribute("type") == Some(suite_type)
}

fn element_children<'a, 'input>(
    node: &Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name(tag))
}

/// Values of `./properties/property[@name=<name>]`.
fn properties(node: &Node, name: &str) -> Vec<String> {
    element_children(node, "properties")
        .flat_map(|props| element_children(&props, "property").collect::<Vec<_>>())
        .filter(|prop| prop.attribute("name") == Some(name))
        .filter_map(|prop| prop.attribute("value").map(str::to_string))
        .collect()
}

fn child_text(node: &Node, tag: &'static str) -> Option<String> {
    element_children(node, tag)
        .next()
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
}

/// NUnit writes `2019-03-26 20:30:21Z`; older runners omit the zone.
fn parse_start_time(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&trimmed.replacen(' ', "T", 1)) {
        return Ok(parsed);
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| {
        AppError::ParseError(format!("Invalid test-run start-time '{}': {}", value, e))
    })?;
    Ok(Utc.from_utc_datetime(&naive).fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<test-run id="2" testcasecount="4" result="Failed" start-time="2019-03-26 20:30:21Z" end-time="2019-03-26 20:31:00Z" duration="39.1">
  <test-suite type="Assembly" id="0-1011" name="Specs.dll" fullname="C:/Specs.dll">
    <test-suite type="TestSuite" id="0-1012" name="Specs" fullname="Specs">
      <test-suite type="TestFixture" id="0-1000" name="LoginTests" fullname="Specs.Features.Account.LoginTests">
        <properties>
          <property name="Description" value="Login" />
          <property name="Category" value="browser" />
        </properties>
        <test-case id="0-1001" name="Log in with valid credentials" fullname="Specs.Features.Account.LoginTests.Valid" result="Passed" duration="7.103904">
          <properties>
            <property name="Category" value="smoke" />
            <property name="Category" value="automated" />
          </properties>
          <attachments>
            <attachment>
              <filePath>C:\screens\login.png</filePath>
              <description>After login</description>
            </attachment>
          </attachments>
        </test-case>
        <test-suite type="ParameterizedMethod" id="0-1003" name="InvalidLogin" fullname="Specs.Features.Account.LoginTests.InvalidLogin">
          <properties>
            <property name="Category" value="regression" />
            <property name="Category" value="automated" />
          </properties>
          <test-case id="0-1004" name="Log in with invalid credentials (Blank Password)" result="Failed" duration="7.567879">
            <failure>
              <message><![CDATA[The Password field is required.]]></message>
            </failure>
          </test-case>
          <test-case id="0-1005" name="Log in with invalid credentials (Blank UserName)" result="Passed" duration="0.5" />
        </test-suite>
      </test-suite>
      <test-suite type="TestFixture" id="0-1100" name="Health" fullname="Health">
        <test-case id="0-1101" name="Ping" result="Skipped" duration="0" />
      </test-suite>
    </test-suite>
  </test-suite>
</test-run>"#;

    #[test]
    fn test_parse_fixture_paths_and_names() {
        let report = parse_report(RESULTS_XML).unwrap();
        assert_eq!(report.cases.len(), 4);

        let login = &report.cases[0];
        assert_eq!(login.fixture_name, "Login");
        assert_eq!(login.fixture_full_path, "Specs.Features.Account.Login");
        assert_eq!(login.title, "Log in with valid credentials");

        let health = &report.cases[3];
        assert_eq!(health.fixture_name, "Health");
        assert_eq!(health.fixture_full_path, "Health");
        assert_eq!(health.outcome, Some(TestOutcome::Skipped));
    }

    #[test]
    fn test_parse_tags_results_and_attachments() {
        let report = parse_report(RESULTS_XML).unwrap();

        let valid = &report.cases[0];
        assert_eq!(valid.fixture_tags, vec!["browser"]);
        assert_eq!(valid.tags, vec!["smoke", "automated"]);
        assert_eq!(valid.outcome, Some(TestOutcome::Passed));
        assert_eq!(valid.duration_seconds.as_deref(), Some("7.103904"));
        assert_eq!(
            valid.attachments,
            vec![Attachment {
                file_path: r"C:\screens\login.png".to_string(),
                description: "After login".to_string(),
            }]
        );

        let invalid = &report.cases[1];
        assert_eq!(invalid.tags, vec!["regression", "automated"]);
        assert_eq!(invalid.outcome, Some(TestOutcome::Failed));
        assert_eq!(invalid.error_text, "The Password field is required.");
        assert!(invalid.attachments.is_empty());
    }

    #[test]
    fn test_parse_start_time() {
        let report = parse_report(RESULTS_XML).unwrap();
        let start = report.start_time.unwrap();
        assert_eq!(start.to_rfc3339(), "2019-03-26T20:30:21+00:00");

        let naive = parse_start_time("2020-01-02 03:04:05.25").unwrap();
        assert_eq!(naive.to_rfc3339(), "2020-01-02T03:04:05.250+00:00");
        assert!(parse_start_time("yesterday").is_err());
    }

    #[test]
    fn test_explore_export_has_no_outcomes() {
        let xml = r#"<test-run id="2" testcasecount="1">
  <test-suite type="TestFixture" name="Cart" fullname="Shop.Cart">
    <test-case name="Adds item" />
  </test-suite>
</test-run>"#;
        let report = parse_report(xml).unwrap();
        assert_eq!(report.start_time, None);
        assert_eq!(report.cases[0].outcome, None);
        assert_eq!(report.cases[0].duration_seconds, None);
        assert_eq!(report.cases[0].fixture_full_path, "Shop.Cart");
    }

    #[test]
    fn test_dotted_description_stays_one_section() {
        let xml = r#"<test-run id="2">
  <test-suite type="TestFixture" name="LoginPage" fullname="Specs.LoginPage">
    <properties><property name="Description" value="Login page v1.2" /></properties>
    <test-case name="Shows form" />
  </test-suite>
  <test-suite type="TestFixture" name="Logout" fullname="Specs.Logout">
    <properties><property name="Description" value="Signs the user out." /></properties>
    <test-case name="Clears session" />
  </test-suite>
</test-run>"#;
        let report = parse_report(xml).unwrap();

        assert_eq!(report.cases[0].fixture_name, "Login page v1_2");
        assert_eq!(report.cases[0].fixture_full_path, "Specs.Login page v1_2");
        assert_eq!(report.cases[1].fixture_name, "Signs the user out");
        assert_eq!(report.cases[1].fixture_full_path, "Specs.Signs the user out");
    }

    #[test]
    fn test_invalid_xml() {
        assert!(matches!(
            parse_report("<test-run><oops></test-run>"),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xml");
        std::fs::write(&path, RESULTS_XML).unwrap();
        assert_eq!(parse_report_file(&path).unwrap().cases.len(), 4);

        let missing = parse_report_file(&dir.path().join("nope.xml")).unwrap_err();
        assert!(matches!(missing, AppError::IoError(_)));
    }
}
