use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, error, info, warn};

use crate::application::use_cases::case_sync::fetch_remote_snapshot;
use crate::application::use_cases::request_executor::RequestExecutor;
use crate::application::use_cases::sync_context::SyncContext;
use crate::domain::error::{AppError, Result};
use crate::domain::test_case::TestCase;
use crate::domain::test_result::{ResultEntry, TestResult};
use crate::domain::test_run::{format_run_name, NewRun};
use crate::infrastructure::testrail::RemoteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSubmission {
    pub run_id: u64,
    pub run_name: String,
    pub result_ids: Vec<u64>,
    pub attachments_uploaded: usize,
}

/// What a results phase needs besides the cases themselves.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub run_name: &'a str,
    pub start_time: DateTime<FixedOffset>,
    pub assignee_email: &'a str,
}

pub struct ResultSubmitter {
    store: Arc<dyn RemoteStore>,
    executor: RequestExecutor,
}

impl ResultSubmitter {
    pub fn new(store: Arc<dyn RemoteStore>, executor: RequestExecutor) -> Self {
        Self { store, executor }
    }

    /// Creates a run for the matched cases, records their results, uploads
    /// attachments and closes the run.
    ///
    /// Every case must already exist under the active root; one that does not
    /// aborts the phase before anything is created.
    pub async fn submit(
        &self,
        context: &SyncContext,
        request: &RunRequest<'_>,
        cases: &[TestCase],
    ) -> Result<ResultSubmission> {
        let snapshot = fetch_remote_snapshot(self.store.as_ref(), &self.executor, context).await?;

        let mut matched: Vec<(u64, &TestResult)> = Vec::with_capacity(cases.len());
        for case in cases {
            let remote_id = snapshot.find_match(case).and_then(|remote| remote.id).ok_or_else(|| {
                AppError::Consistency(format!(
                    "No matching test case found for test result. Sync this test case into TestRail before syncing results. {}",
                    case
                ))
            })?;

            match &case.result {
                Some(result) => matched.push((remote_id, result)),
                None => warn!(case_id = remote_id, "No result recorded for '{}', skipping", case.title),
            }
        }

        let assignee_id = self
            .executor
            .execute_required("get_user_by_email", || {
                self.store.resolve_user_id_by_email(request.assignee_email)
            })
            .await?;

        let mut seen = HashSet::new();
        let case_ids: Vec<u64> = matched
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| seen.insert(*id))
            .collect();

        let run = NewRun {
            name: format_run_name(request.run_name, &request.start_time),
            assignedto_id: assignee_id,
            case_ids,
            include_all: false,
        };
        let run_id = self
            .executor
            .execute_required("add_run", || self.store.create_run(context.project_id, &run))
            .await?;
        info!(run_id, "Created test run '{}'", run.name);

        let entries = matched
            .iter()
            .map(|(case_id, result)| result.to_entry(*case_id))
            .collect::<Result<Vec<ResultEntry>>>()?;

        info!("Submitting test results to TestRail..");
        let result_ids = self.submit_entries(run_id, &entries).await?;

        let mut attachments_uploaded = 0;
        for ((_, result), result_id) in matched.iter().zip(&result_ids) {
            for attachment in &result.attachments {
                let path = Path::new(&attachment.file_path);
                self.executor
                    .execute_required("add_attachment_to_result", || {
                        self.store.attach_to_result(*result_id, path)
                    })
                    .await?;
                debug!(result_id, "Attached {}", attachment.file_path);
                attachments_uploaded += 1;
            }
        }

        self.executor
            .execute_required("close_run", || self.store.close_run(run_id))
            .await?;
        info!(run_id, results = result_ids.len(), "Closed test run");

        Ok(ResultSubmission {
            run_id,
            run_name: run.name,
            result_ids,
            attachments_uploaded,
        })
    }

    /// The store answers with one result per entry, in request order.
    async fn submit_entries(&self, run_id: u64, entries: &[ResultEntry]) -> Result<Vec<u64>> {
        let submitted = self
            .executor
            .execute_required("add_results_for_cases", || {
                self.store.submit_results(run_id, entries)
            })
            .await;

        let result_ids = match submitted {
            Ok(ids) => ids,
            Err(err) => {
                log_payload(entries);
                return Err(err);
            }
        };

        if result_ids.len() != entries.len() {
            log_payload(entries);
            return Err(AppError::Consistency(format!(
                "Submitted {} results but TestRail returned {} result ids",
                entries.len(),
                result_ids.len()
            )));
        }

        Ok(result_ids)
    }
}

fn log_payload(entries: &[ResultEntry]) {
    match serde_json::to_string(entries) {
        Ok(payload) => error!(payload = %payload, "Result submission failed"),
        Err(e) => error!("Result submission failed; payload not serializable: {}", e),
    }
}
