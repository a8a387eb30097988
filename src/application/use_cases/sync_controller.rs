use std::sync::Arc;

use tracing::{error, info};

use crate::application::use_cases::case_sync::{CaseReconciler, CaseSyncSummary};
use crate::application::use_cases::hierarchy_builder::SectionHierarchy;
use crate::application::use_cases::request_executor::{RequestExecutor, RetryPolicy};
use crate::application::use_cases::result_submitter::{ResultSubmission, ResultSubmitter, RunRequest};
use crate::application::use_cases::section_sync::SectionReconciler;
use crate::application::use_cases::sync_context::SyncContext;
use crate::application::use_cases::tag_resolution::CaseTypeResolver;
use crate::domain::error::{AppError, Result};
use crate::domain::report::TestReport;
use crate::domain::sync_config::SyncConfig;
use crate::domain::test_case::TestCase;
use crate::infrastructure::testrail::RemoteStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub cases: Option<CaseSyncSummary>,
    pub results: Option<ResultSubmission>,
}

/// Drives one sync run against a single project.
pub struct SyncController {
    store: Arc<dyn RemoteStore>,
    executor: RequestExecutor,
    project_id: u64,
    root_section_name: String,
    user_email: String,
    run_name: String,
}

impl SyncController {
    pub fn new(store: Arc<dyn RemoteStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            executor: RequestExecutor::new(RetryPolicy::from_config(config)),
            project_id: config.testrail_project_id,
            root_section_name: config.root_section_name.clone(),
            user_email: config.testrail_user_email.clone(),
            run_name: config.testrail_run_name.clone().unwrap_or_default(),
        }
    }

    /// Runs every phase that has a report, cases first.
    pub async fn run(
        &self,
        cases_report: Option<&TestReport>,
        results_report: Option<&TestReport>,
    ) -> Result<SyncSummary> {
        self.test_connection().await?;
        let context = self.initialize_root_section().await?;

        let mut summary = SyncSummary::default();
        if let Some(report) = cases_report {
            summary.cases = Some(self.sync_test_cases(&context, report).await?);
        }
        if let Some(report) = results_report {
            summary.results = Some(self.sync_test_results(&context, report).await?);
        }
        Ok(summary)
    }

    /// Resolves the authenticated user's id; any failure ends the run.
    pub async fn test_connection(&self) -> Result<u64> {
        let user_email = self.user_email.as_str();
        let outcome = self
            .executor
            .execute_required("get_user_by_email", || {
                self.store.resolve_user_id_by_email(user_email)
            })
            .await;

        match outcome {
            Ok(user_id) => {
                info!(user_id, "TestRail connection established");
                Ok(user_id)
            }
            Err(err) => {
                error!("TestRail connection failed.");
                Err(err)
            }
        }
    }

    pub async fn initialize_root_section(&self) -> Result<SyncContext> {
        let root = self
            .section_reconciler()
            .ensure_root_section(self.project_id, &self.root_section_name)
            .await?;
        let context = SyncContext::new(self.project_id, &root)?;
        info!(
            root_section_id = context.root_section_id,
            "Using root section '{}'", context.root_section_name
        );
        Ok(context)
    }

    /// Mirrors the report's fixtures as sections and its tests as cases.
    pub async fn sync_test_cases(
        &self,
        context: &SyncContext,
        report: &TestReport,
    ) -> Result<CaseSyncSummary> {
        let local = self.load_local_cases(report).await?;

        let hierarchy =
            SectionHierarchy::from_paths(local.iter().map(|case| case.fixture_full_path.as_str()));
        let section_map = self.section_reconciler().reconcile(context, &hierarchy).await?;

        let summary = CaseReconciler::new(self.store.clone(), self.executor.clone())
            .reconcile(context, &local, &section_map)
            .await?;
        info!(
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            "Test case sync complete"
        );
        Ok(summary)
    }

    /// Records the report's outcomes as a new, closed test run.
    pub async fn sync_test_results(
        &self,
        context: &SyncContext,
        report: &TestReport,
    ) -> Result<ResultSubmission> {
        let start_time = report.start_time.ok_or_else(|| {
            AppError::ValidationError(
                "The results file has no test-run start-time; was it produced by --explore?"
                    .to_string(),
            )
        })?;
        let local = self.load_local_cases(report).await?;

        let request = RunRequest {
            run_name: &self.run_name,
            start_time,
            assignee_email: &self.user_email,
        };
        ResultSubmitter::new(self.store.clone(), self.executor.clone())
            .submit(context, &request, &local)
            .await
    }

    /// Types the report's records against the store's case types.
    pub async fn load_local_cases(&self, report: &TestReport) -> Result<Vec<TestCase>> {
        if report.cases.is_empty() {
            return Err(AppError::ValidationError(
                "The NUnit file contains no test cases".to_string(),
            ));
        }

        let types = self
            .executor
            .execute_required("get_case_types", || self.store.list_case_types())
            .await?;
        let resolver = CaseTypeResolver::new(types)?;
        Ok(resolver.build_cases(&report.cases))
    }

    fn section_reconciler(&self) -> SectionReconciler {
        SectionReconciler::new(self.store.clone(), self.executor.clone())
    }
}
