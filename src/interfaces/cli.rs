use std::path::PathBuf;

use clap::Parser;

use crate::infrastructure::config::ConfigOverrides;

/// Mirror NUnit3 test suites and results into TestRail.
#[derive(Debug, Parser)]
#[command(name = "railsync", author, version, about, long_about = None)]
pub struct Cli {
    /// NUnit3 export of the test cases (nunit3-console --explore)
    #[arg(long, value_name = "FILE")]
    pub nunit_test_cases_file: Option<PathBuf>,
    /// NUnit3 results file of an executed test run
    #[arg(long, value_name = "FILE")]
    pub nunit_test_results_file: Option<PathBuf>,
    #[arg(long, value_name = "URL")]
    pub testrail_url: Option<String>,
    #[arg(long, value_name = "EMAIL")]
    pub testrail_user_email: Option<String>,
    /// Falls back to the OS keyring when omitted
    #[arg(long, value_name = "PASSWORD")]
    pub testrail_user_password: Option<String>,
    #[arg(long, value_name = "ID")]
    pub testrail_project_id: Option<u64>,
    /// Prefix of the created test run's name
    #[arg(long, value_name = "NAME")]
    pub testrail_run_name: Option<String>,
    /// Top-level TestRail section that holds the synced tree [default: Synced]
    #[arg(long, value_name = "NAME")]
    pub root_section_name: Option<String>,
    /// TOML config file [default: ./railsync.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Store the given password in the OS keyring for later runs
    #[arg(long)]
    pub save_password: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            testrail_url: self.testrail_url.clone(),
            testrail_user_email: self.testrail_user_email.clone(),
            testrail_user_password: self.testrail_user_password.clone(),
            testrail_project_id: self.testrail_project_id,
            testrail_run_name: self.testrail_run_name.clone(),
            root_section_name: self.root_section_name.clone(),
            nunit_test_cases_file: self.nunit_test_cases_file.clone(),
            nunit_test_results_file: self.nunit_test_results_file.clone(),
        }
    }
}
