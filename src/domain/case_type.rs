use crate::domain::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseType {
    pub id: u64,
    pub name: String,
    pub is_default: bool,
}

/// Returns the single type flagged as default.
///
/// The store is expected to expose exactly one; anything else is a
/// configuration problem on the TestRail side.
pub fn default_case_type(types: &[TestCaseType]) -> Result<&TestCaseType> {
    let mut defaults = types.iter().filter(|t| t.is_default);
    match (defaults.next(), defaults.next()) {
        (Some(default), None) => Ok(default),
        (None, _) => Err(AppError::ConfigError(
            "No default case type is configured in TestRail".to_string(),
        )),
        (Some(first), Some(second)) => Err(AppError::ConfigError(format!(
            "Multiple default case types are configured in TestRail ('{}', '{}', ...)",
            first.name, second.name
        ))),
    }
}
