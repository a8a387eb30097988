//! In-memory `RemoteStore` used by the reconciliation tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::case_type::TestCaseType;
use crate::domain::error::{AppError, RemoteError, Result};
use crate::domain::section::{NewSection, Section};
use crate::domain::test_case::{CasePayload, TestCase};
use crate::domain::test_result::ResultEntry;
use crate::domain::test_run::NewRun;
use crate::infrastructure::testrail::RemoteStore;

#[derive(Debug, Default)]
pub struct StoreState {
    pub sections: Vec<Section>,
    pub cases: Vec<TestCase>,
    pub case_types: Vec<TestCaseType>,
    pub users: HashMap<String, u64>,
    pub runs: Vec<(u64, NewRun)>,
    pub results: Vec<(u64, Vec<ResultEntry>)>,
    pub attachments: Vec<(u64, PathBuf)>,
    pub closed_runs: Vec<u64>,
    /// Drops the last result id of every `submit_results` response.
    pub truncate_result_ids: bool,
    calls: Vec<String>,
    failures: VecDeque<(String, RemoteError)>,
    next_id: u64,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regression, Other (default) and Smoke, plus one known user.
    pub fn with_defaults() -> Self {
        let store = Self::new();
        {
            let mut state = store.state();
            state.case_types = vec![
                TestCaseType { id: 1, name: "Regression".to_string(), is_default: false },
                TestCaseType { id: 2, name: "Other".to_string(), is_default: true },
                TestCaseType { id: 3, name: "Smoke".to_string(), is_default: false },
            ];
            state.users.insert("qa@example.com".to_string(), 7);
            state.next_id = 100;
        }
        store
    }

    pub fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    /// Queues a failure for the next call of `operation`.
    pub fn fail_next(&self, operation: &str, error: RemoteError) {
        self.state().failures.push_back((operation.to_string(), error));
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state().calls.iter().filter(|call| *call == operation).count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn add_section(&self, name: &str, parent_id: Option<u64>) -> u64 {
        let mut state = self.state();
        insert_section(&mut state, name, parent_id)
    }

    pub fn add_case(&self, title: &str, section_id: u64, type_id: u64, is_automated: bool) -> u64 {
        let mut state = self.state();
        let id = state.next_id();
        state.cases.push(TestCase {
            id: Some(id),
            title: title.to_string(),
            section_id: Some(section_id),
            type_id,
            is_automated,
            ..Default::default()
        });
        id
    }

    pub fn section_named(&self, name: &str) -> Option<Section> {
        self.state().sections.iter().find(|s| s.name == name).cloned()
    }

    pub fn cases_in_section(&self, section_id: u64) -> Vec<TestCase> {
        self.state()
            .cases
            .iter()
            .filter(|c| c.section_id == Some(section_id))
            .cloned()
            .collect()
    }

    fn begin(&self, operation: &str) -> std::result::Result<MutexGuard<'_, StoreState>, AppError> {
        let mut state = self.state();
        state.calls.push(operation.to_string());
        if let Some(index) = state.failures.iter().position(|(op, _)| op == operation) {
            if let Some((_, error)) = state.failures.remove(index) {
                return Err(AppError::Remote(error));
            }
        }
        Ok(state)
    }
}

fn insert_section(state: &mut StoreState, name: &str, parent_id: Option<u64>) -> u64 {
    let depth = match parent_id {
        Some(parent) => state
            .sections
            .iter()
            .find(|s| s.id == Some(parent))
            .and_then(|s| s.depth)
            .map_or(1, |d| d + 1),
        None => 0,
    };
    let id = state.next_id();
    state.sections.push(Section {
        id: Some(id),
        name: name.to_string(),
        depth: Some(depth),
        parent_id,
        ..Default::default()
    });
    id
}

fn bad_request(message: String) -> AppError {
    AppError::Remote(RemoteError::new(Some(400), message))
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn list_sections(&self, _project_id: u64) -> Result<Vec<Section>> {
        let state = self.begin("list_sections")?;
        Ok(state
            .sections
            .iter()
            .map(|s| Section { root_section_id: None, ..s.clone() })
            .collect())
    }

    async fn create_section(&self, _project_id: u64, section: &NewSection) -> Result<Section> {
        let mut state = self.begin("create_section")?;
        let id = insert_section(&mut state, &section.name, section.parent_id);
        let created = state.sections.iter().find(|s| s.id == Some(id)).cloned();
        created.ok_or_else(|| bad_request(format!("Section {} vanished", id)))
    }

    async fn list_cases(&self, _project_id: u64) -> Result<Vec<TestCase>> {
        let state = self.begin("list_cases")?;
        Ok(state
            .cases
            .iter()
            .map(|c| TestCase {
                id: c.id,
                title: c.title.clone(),
                section_id: c.section_id,
                type_id: c.type_id,
                is_automated: c.is_automated,
                ..Default::default()
            })
            .collect())
    }

    async fn create_case(&self, section_id: u64, case: &CasePayload) -> Result<TestCase> {
        let mut state = self.begin("create_case")?;
        if !state.sections.iter().any(|s| s.id == Some(section_id)) {
            return Err(bad_request(format!("Field :section_id is not a valid section ({})", section_id)));
        }
        let id = state.next_id();
        let created = TestCase {
            id: Some(id),
            title: case.title.clone(),
            section_id: Some(section_id),
            type_id: case.type_id,
            is_automated: case.custom_is_automated,
            ..Default::default()
        };
        state.cases.push(created.clone());
        Ok(created)
    }

    async fn update_case(&self, case_id: u64, case: &CasePayload) -> Result<TestCase> {
        let mut state = self.begin("update_case")?;
        let existing = state
            .cases
            .iter_mut()
            .find(|c| c.id == Some(case_id))
            .ok_or_else(|| bad_request(format!("Field :case_id is not a valid test case ({})", case_id)))?;
        existing.title = case.title.clone();
        existing.type_id = case.type_id;
        existing.is_automated = case.custom_is_automated;
        Ok(existing.clone())
    }

    async fn delete_case(&self, case_id: u64) -> Result<()> {
        let mut state = self.begin("delete_case")?;
        let before = state.cases.len();
        state.cases.retain(|c| c.id != Some(case_id));
        if state.cases.len() == before {
            return Err(bad_request(format!("Field :case_id is not a valid test case ({})", case_id)));
        }
        Ok(())
    }

    async fn list_case_types(&self) -> Result<Vec<TestCaseType>> {
        let state = self.begin("list_case_types")?;
        Ok(state.case_types.clone())
    }

    async fn create_run(&self, _project_id: u64, run: &NewRun) -> Result<u64> {
        let mut state = self.begin("create_run")?;
        let id = state.next_id();
        state.runs.push((id, run.clone()));
        Ok(id)
    }

    async fn submit_results(&self, run_id: u64, results: &[ResultEntry]) -> Result<Vec<u64>> {
        let mut state = self.begin("submit_results")?;
        state.results.push((run_id, results.to_vec()));
        let mut ids: Vec<u64> = results.iter().map(|_| state.next_id()).collect();
        if state.truncate_result_ids {
            ids.pop();
        }
        Ok(ids)
    }

    async fn attach_to_result(&self, result_id: u64, file_path: &Path) -> Result<()> {
        let mut state = self.begin("attach_to_result")?;
        state.attachments.push((result_id, file_path.to_path_buf()));
        Ok(())
    }

    async fn close_run(&self, run_id: u64) -> Result<()> {
        let mut state = self.begin("close_run")?;
        state.closed_runs.push(run_id);
        Ok(())
    }

    async fn resolve_user_id_by_email(&self, email: &str) -> Result<u64> {
        let state = self.begin("resolve_user_id_by_email")?;
        state
            .users
            .get(email)
            .copied()
            .ok_or_else(|| bad_request(format!("Field :email is not a valid user ({})", email)))
    }
}
