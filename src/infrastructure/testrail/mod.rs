pub mod client;
mod wire;

use std::path::Path;

use async_trait::async_trait;

use crate::domain::case_type::TestCaseType;
use crate::domain::error::Result;
use crate::domain::section::{NewSection, Section};
use crate::domain::test_case::{CasePayload, TestCase};
use crate::domain::test_result::ResultEntry;
use crate::domain::test_run::NewRun;

pub use client::TestRailClient;

/// Everything the sync engine needs from a test-management store.
///
/// Each method is one remote call and the unit of retry for
/// [`RequestExecutor`](crate::application::use_cases::request_executor::RequestExecutor).
/// Sections come back without `root_section_id`; cases come back with only
/// `id`, `title`, `section_id`, `type_id` and `is_automated` populated.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_sections(&self, project_id: u64) -> Result<Vec<Section>>;
    async fn create_section(&self, project_id: u64, section: &NewSection) -> Result<Section>;
    async fn list_cases(&self, project_id: u64) -> Result<Vec<TestCase>>;
    async fn create_case(&self, section_id: u64, case: &CasePayload) -> Result<TestCase>;
    async fn update_case(&self, case_id: u64, case: &CasePayload) -> Result<TestCase>;
    async fn delete_case(&self, case_id: u64) -> Result<()>;
    async fn list_case_types(&self) -> Result<Vec<TestCaseType>>;
    async fn create_run(&self, project_id: u64, run: &NewRun) -> Result<u64>;
    /// Returns one result id per entry, in request order.
    async fn submit_results(&self, run_id: u64, results: &[ResultEntry]) -> Result<Vec<u64>>;
    async fn attach_to_result(&self, result_id: u64, file_path: &Path) -> Result<()>;
    async fn close_run(&self, run_id: u64) -> Result<()>;
    async fn resolve_user_id_by_email(&self, email: &str) -> Result<u64>;
}
