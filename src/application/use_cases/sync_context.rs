use crate::domain::error::{AppError, Result};
use crate::domain::section::Section;

/// Run-scoped facts every reconciliation step needs.
///
/// Built once after the root section is known and passed by reference
/// through every phase of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    pub project_id: u64,
    pub root_section_id: u64,
    pub root_section_name: String,
}

impl SyncContext {
    pub fn new(project_id: u64, root_section: &Section) -> Result<Self> {
        let root_section_id = root_section.id.ok_or_else(|| {
            AppError::Consistency(format!(
                "Root section '{}' has no id",
                root_section.name
            ))
        })?;

        Ok(Self {
            project_id,
            root_section_id,
            root_section_name: root_section.name.clone(),
        })
    }

    pub fn owns(&self, section: &Section) -> bool {
        section.root_section_id == Some(self.root_section_id)
    }
}
