use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_ROOT_SECTION_NAME: &str = "Synced";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_MAINTENANCE_COOLDOWN_SECONDS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SyncConfig {
    #[validate(url(message = "TestRail URL must be an absolute URL"))]
    pub testrail_url: String,
    #[validate(email(message = "TestRail user email is not a valid email address"))]
    pub testrail_user_email: String,
    #[serde(skip_serializing)]
    pub testrail_user_password: Option<String>,
    #[validate(range(min = 1, message = "TestRail project id is required"))]
    pub testrail_project_id: u64,
    pub testrail_run_name: Option<String>,
    #[validate(length(min = 1, message = "Root section name must not be empty"))]
    pub root_section_name: String,
    pub nunit_test_cases_file: Option<PathBuf>,
    pub nunit_test_results_file: Option<PathBuf>,
    #[validate(range(min = 1, message = "At least one request attempt is required"))]
    pub max_attempts: u32,
    pub maintenance_cooldown_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            testrail_url: String::new(),
            testrail_user_email: String::new(),
            testrail_user_password: None,
            testrail_project_id: 0,
            testrail_run_name: None,
            root_section_name: DEFAULT_ROOT_SECTION_NAME.to_string(),
            nunit_test_cases_file: None,
            nunit_test_results_file: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            maintenance_cooldown_seconds: DEFAULT_MAINTENANCE_COOLDOWN_SECONDS,
        }
    }
}

impl SyncConfig {
    pub fn should_sync_test_cases(&self) -> bool {
        self.nunit_test_cases_file.is_some()
    }

    pub fn should_sync_test_results(&self) -> bool {
        self.nunit_test_results_file.is_some()
    }
}
