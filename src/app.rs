use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::use_cases::sync_controller::{SyncController, SyncSummary};
use crate::domain::error::Result;
use crate::domain::sync_config::SyncConfig;
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::nunit::parse_report_file;
use crate::infrastructure::testrail::TestRailClient;
use crate::interfaces::cli::Cli;

const INVALID_OPTIONS: u8 = 2;

pub fn run() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config_service = ConfigService::new();

    let mut config = match config_service.load(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(INVALID_OPTIONS);
        }
    };

    if cli.save_password {
        let Some(password) = config.testrail_user_password.as_deref() else {
            error!("--save-password needs a password from --testrail-user-password or the environment");
            return ExitCode::from(INVALID_OPTIONS);
        };
        if let Err(e) = config_service.save_password(&config.testrail_user_email, password) {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
        info!("Password stored in the keyring for {}", config.testrail_user_email);
    }

    let password = match config_service.resolve_password(&mut config) {
        Ok(password) => password,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(INVALID_OPTIONS);
        }
    };

    print_options(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let span = info_span!("sync", run_id = %Uuid::new_v4());
    match runtime.block_on(sync(&config, &password).instrument(span)) {
        Ok(_) => {
            info!("TestRail-NUnit-Sync completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            error!("TestRail-NUnit-Sync completed unsuccessfully.");
            ExitCode::FAILURE
        }
    }
}

async fn sync(config: &SyncConfig, password: &str) -> Result<SyncSummary> {
    let cases_report = config
        .nunit_test_cases_file
        .as_deref()
        .map(parse_report_file)
        .transpose()?;
    let results_report = config
        .nunit_test_results_file
        .as_deref()
        .map(parse_report_file)
        .transpose()?;

    let client = TestRailClient::new(&config.testrail_url, &config.testrail_user_email, password)?;
    SyncController::new(Arc::new(client), config)
        .run(cases_report.as_ref(), results_report.as_ref())
        .await
}

fn print_options(config: &SyncConfig) {
    info!("TestRail-NUnit-Sync v.{}", env!("CARGO_PKG_VERSION"));
    info!("Syncing NUnit3 Tests into TestRail based on the following parameters");
    for line in options_summary(config) {
        info!("{}", line);
    }
}

/// Option banner lines, with the password masked.
fn options_summary(config: &SyncConfig) -> Vec<String> {
    let path_or_empty = |path: Option<&Path>| {
        path.map(|p| p.display().to_string()).unwrap_or_default()
    };

    vec![
        format!("NUnit Test Cases File    : {}", path_or_empty(config.nunit_test_cases_file.as_deref())),
        format!("NUnit Test Results File  : {}", path_or_empty(config.nunit_test_results_file.as_deref())),
        format!("Should Sync Test Cases   : {}", config.should_sync_test_cases()),
        format!("Should Sync Test Results : {}", config.should_sync_test_results()),
        format!("TestRail URL             : {}", config.testrail_url),
        format!("TestRail User Email      : {}", config.testrail_user_email),
        "TestRail User Password   : ********".to_string(),
        format!("TestRail Project ID      : {}", config.testrail_project_id),
        format!("TestRail Run Name        : {}", config.testrail_run_name.as_deref().unwrap_or_default()),
        format!("Root Section Name        : {}", config.root_section_name),
    ]
}
