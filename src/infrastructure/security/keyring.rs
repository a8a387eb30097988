use crate::domain::error::{AppError, Result};
use keyring::Entry;

/// TestRail passwords stored in the OS credential store, one entry per
/// user email.
pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, user_email: &str) -> Result<Entry> {
        Entry::new(&self.service, user_email)
            .map_err(|e| AppError::SecurityError(format!("Failed to open keyring entry: {}", e)))
    }

    pub fn store_password(&self, user_email: &str, password: &str) -> Result<()> {
        write_entry(&self.entry(user_email)?, password)
    }

    /// `Ok(None)` when nothing is stored for `user_email`.
    pub fn read_password(&self, user_email: &str) -> Result<Option<String>> {
        read_entry(&self.entry(user_email)?)
    }
}

fn write_entry(entry: &Entry, password: &str) -> Result<()> {
    entry
        .set_password(password)
        .map_err(|e| AppError::SecurityError(format!("Failed to store password: {}", e)))
}

fn read_entry(entry: &Entry) -> Result<Option<String>> {
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(AppError::SecurityError(format!(
            "Failed to read password: {}",
            e
        ))),
    }
}
