//! Layered run configuration.
//!
//! Precedence, lowest first: built-in defaults, `railsync.toml` (or the file
//! given with `--config`), `RAILSYNC_*` environment variables, command-line
//! flags. The password may also come from the OS keyring.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::Serialize;
use tracing::debug;
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::sync_config::SyncConfig;
use crate::infrastructure::security::keyring::KeyringManager;

pub const CONFIG_FILE_NAME: &str = "railsync.toml";
pub const ENV_PREFIX: &str = "RAILSYNC_";
pub const KEYRING_SERVICE: &str = "railsync";

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testrail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testrail_user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testrail_user_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testrail_project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testrail_run_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_section_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nunit_test_cases_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nunit_test_results_file: Option<PathBuf>,
}

pub struct ConfigService {
    keyring: KeyringManager,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    pub fn figment(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let file = config_file.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME));
        Figment::from(Serialized::defaults(SyncConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Merges every layer and validates the result. Does not touch the keyring.
    pub fn load(&self, config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<SyncConfig> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(AppError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        let config: SyncConfig = Self::figment(config_file, overrides)
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        validate_config(&config)?;
        debug!(project_id = config.testrail_project_id, "Configuration loaded");
        Ok(config)
    }

    /// Fills in the password from the keyring when no layer provided one.
    pub fn resolve_password(&self, config: &mut SyncConfig) -> Result<String> {
        if let Some(password) = config.testrail_user_password.as_deref() {
            if !password.is_empty() {
                return Ok(password.to_string());
            }
        }

        let stored = self.keyring.read_password(&config.testrail_user_email)?.ok_or_else(|| {
            AppError::ConfigError(format!(
                "No TestRail password supplied and none stored in the keyring for {}",
                config.testrail_user_email
            ))
        })?;
        config.testrail_user_password = Some(stored.clone());
        Ok(stored)
    }

    pub fn save_password(&self, user_email: &str, password: &str) -> Result<()> {
        self.keyring.store_password(user_email, password)
    }
}

pub fn validate_config(config: &SyncConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if !config.should_sync_test_cases() && !config.should_sync_test_results() {
        return Err(AppError::ValidationError(
            "No NUnit Test Cases file or Test Results file supplied.".to_string(),
        ));
    }
    if let Some(path) = &config.nunit_test_cases_file {
        if !path.is_file() {
            return Err(AppError::ValidationError(format!(
                "NUnit Test Cases file not found: {}",
                path.display()
            )));
        }
    }
    if let Some(path) = &config.nunit_test_results_file {
        if !path.is_file() {
            return Err(AppError::ValidationError(format!(
                "NUnit Test Results file not found: {}",
                path.display()
            )));
        }
    }
    Ok(())
}
