use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::use_cases::request_executor::RequestExecutor;
use crate::application::use_cases::section_sync::{fetch_sections, SectionMap};
use crate::application::use_cases::sync_context::SyncContext;
use crate::domain::error::{AppError, Result};
use crate::domain::section::Section;
use crate::domain::test_case::TestCase;
use crate::infrastructure::testrail::RemoteStore;

/// Remote cases and sections restricted to the active root's subtree.
///
/// Every case carries the name of its section in `fixture_name`.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    pub cases: Vec<TestCase>,
    pub sections: Vec<Section>,
}

impl RemoteSnapshot {
    /// First remote case sharing `local`'s identity key.
    pub fn find_match(&self, local: &TestCase) -> Option<&TestCase> {
        let key = local.identity_key();
        self.cases.iter().find(|remote| remote.identity_key() == key)
    }
}

pub async fn fetch_remote_snapshot(
    store: &dyn RemoteStore,
    executor: &RequestExecutor,
    context: &SyncContext,
) -> Result<RemoteSnapshot> {
    let cases = executor
        .execute_required("get_cases", || store.list_cases(context.project_id))
        .await?;
    let sections = fetch_sections(store, executor, context.project_id).await?;
    build_snapshot(cases, sections, context)
}

fn build_snapshot(
    cases: Vec<TestCase>,
    sections: Vec<Section>,
    context: &SyncContext,
) -> Result<RemoteSnapshot> {
    let owned_cases = {
        let by_id: HashMap<u64, &Section> = sections
            .iter()
            .filter_map(|section| section.id.map(|id| (id, section)))
            .collect();

        let mut owned = Vec::new();
        for mut case in cases {
            let section = case
                .section_id
                .and_then(|id| by_id.get(&id))
                .ok_or_else(|| {
                    AppError::Consistency(format!(
                        "Test case '{}' (id {:?}) references unknown section {:?}",
                        case.title, case.id, case.section_id
                    ))
                })?;

            if !context.owns(section) {
                continue;
            }
            case.fixture_name = section.name.clone();
            case.root_section_id = section.root_section_id;
            owned.push(case);
        }
        owned
    };

    let owned_sections = sections.into_iter().filter(|s| context.owns(s)).collect();
    Ok(RemoteSnapshot {
        cases: owned_cases,
        sections: owned_sections,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasePlan {
    pub to_create: Vec<TestCase>,
    pub to_update: Vec<TestCase>,
    pub to_delete: Vec<TestCase>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseSyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Splits local and remote cases into create, update and delete sets.
///
/// A changed title changes the identity key, so a renamed test shows up as
/// one creation plus one deletion.
pub fn plan_case_changes(
    local: &[TestCase],
    snapshot: &RemoteSnapshot,
    section_map: &SectionMap,
) -> Result<CasePlan> {
    let mut remote_by_key: HashMap<String, &TestCase> = HashMap::new();
    for remote in &snapshot.cases {
        remote_by_key.entry(remote.identity_key()).or_insert(remote);
    }

    let mut plan = CasePlan::default();
    for case in local {
        match remote_by_key.get(&case.identity_key()) {
            None => {
                let section_id = placement_for(case, snapshot, section_map)?;
                plan.to_create.push(TestCase {
                    section_id: Some(section_id),
                    ..case.clone()
                });
            }
            Some(remote) if !case.matches_other(remote) => {
                plan.to_update.push(TestCase {
                    id: remote.id,
                    section_id: remote.section_id,
                    ..case.clone()
                });
            }
            Some(_) => {}
        }
    }

    let local_keys: HashSet<String> = local.iter().map(TestCase::identity_key).collect();
    plan.to_delete = snapshot
        .cases
        .iter()
        .filter(|remote| !local_keys.contains(&remote.identity_key()))
        .cloned()
        .collect();

    Ok(plan)
}

fn placement_for(case: &TestCase, snapshot: &RemoteSnapshot, section_map: &SectionMap) -> Result<u64> {
    section_map
        .id_for_path(&case.fixture_full_path)
        .or_else(|| {
            snapshot
                .sections
                .iter()
                .find(|s| s.name == case.fixture_name)
                .and_then(|s| s.id)
        })
        .ok_or_else(|| {
            AppError::Consistency(format!(
                "No section found for fixture '{}' ({})",
                case.fixture_name, case.fixture_full_path
            ))
        })
}

pub struct CaseReconciler {
    store: Arc<dyn RemoteStore>,
    executor: RequestExecutor,
}

impl CaseReconciler {
    pub fn new(store: Arc<dyn RemoteStore>, executor: RequestExecutor) -> Self {
        Self { store, executor }
    }

    pub async fn reconcile(
        &self,
        context: &SyncContext,
        local: &[TestCase],
        section_map: &SectionMap,
    ) -> Result<CaseSyncSummary> {
        let snapshot = fetch_remote_snapshot(self.store.as_ref(), &self.executor, context).await?;
        let plan = plan_case_changes(local, &snapshot, section_map)?;
        self.apply(&plan).await
    }

    /// Creates, then updates, then deletes; one call per case.
    pub async fn apply(&self, plan: &CasePlan) -> Result<CaseSyncSummary> {
        info!("Processing test cases in TestRail..");
        info!("Create: {}", plan.to_create.len());
        info!("Update: {}", plan.to_update.len());
        info!("Delete: {}", plan.to_delete.len());

        let mut summary = CaseSyncSummary::default();

        for case in &plan.to_create {
            let section_id = case.section_id.ok_or_else(|| {
                AppError::Consistency(format!("Cannot create case without a section: {}", case))
            })?;
            let payload = case.to_payload();
            let created = self
                .executor
                .execute_required("add_case", || self.store.create_case(section_id, &payload))
                .await?;
            debug!(case_id = ?created.id, section_id, "Created test case '{}'", case.title);
            summary.created += 1;
        }

        for case in &plan.to_update {
            let case_id = required_id(case)?;
            let payload = case.to_payload();
            self.executor
                .execute_required("update_case", || self.store.update_case(case_id, &payload))
                .await?;
            debug!(case_id, "Updated test case '{}'", case.title);
            summary.updated += 1;
        }

        for case in &plan.to_delete {
            let case_id = required_id(case)?;
            self.executor
                .execute_required("delete_case", || self.store.delete_case(case_id))
                .await?;
            debug!(case_id, "Deleted test case '{}'", case.title);
            summary.deleted += 1;
        }

        Ok(summary)
    }
}

fn required_id(case: &TestCase) -> Result<u64> {
    case.id
        .ok_or_else(|| AppError::Consistency(format!("Test case has no remote id: {}", case)))
}
