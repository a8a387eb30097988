//! Response shapes of the TestRail v2 API.

use serde::Deserialize;

use crate::domain::case_type::TestCaseType;
use crate::domain::section::Section;
use crate::domain::test_case::TestCase;

#[derive(Debug, Deserialize)]
pub(crate) struct SectionDto {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

impl From<SectionDto> for Section {
    fn from(dto: SectionDto) -> Self {
        Section {
            id: Some(dto.id),
            name: dto.name,
            description: dto.description.unwrap_or_default(),
            depth: dto.depth,
            parent_id: dto.parent_id,
            root_section_id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseDto {
    pub id: u64,
    pub title: String,
    pub section_id: u64,
    #[serde(default)]
    pub type_id: Option<u64>,
    #[serde(default)]
    pub custom_is_automated: Option<bool>,
}

impl From<CaseDto> for TestCase {
    fn from(dto: CaseDto) -> Self {
        TestCase {
            id: Some(dto.id),
            title: dto.title,
            type_id: dto.type_id.unwrap_or_default(),
            is_automated: dto.custom_is_automated.unwrap_or(false),
            section_id: Some(dto.section_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseTypeDto {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

impl From<CaseTypeDto> for TestCaseType {
    fn from(dto: CaseTypeDto) -> Self {
        TestCaseType {
            id: dto.id,
            name: dto.name,
            is_default: dto.is_default,
        }
    }
}

/// Any object whose only field we care about is `id` (users, runs, results).
#[derive(Debug, Deserialize)]
pub(crate) struct IdDto {
    pub id: u64,
}
