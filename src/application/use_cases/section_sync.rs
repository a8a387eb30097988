use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::use_cases::hierarchy_builder::SectionHierarchy;
use crate::application::use_cases::request_executor::RequestExecutor;
use crate::application::use_cases::sync_context::SyncContext;
use crate::domain::error::{AppError, Result};
use crate::domain::section::{assign_root_ids, NewSection, Section};
use crate::infrastructure::testrail::RemoteStore;

/// Section ids produced by one reconciliation pass, keyed by dotted prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    ids_by_path: HashMap<String, u64>,
    pub created: usize,
    pub reused: usize,
}

impl SectionMap {
    pub fn id_for_path(&self, path: &str) -> Option<u64> {
        self.ids_by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.ids_by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids_by_path.is_empty()
    }
}

/// Fetches every section of the project with `root_section_id` filled in.
pub async fn fetch_sections(
    store: &dyn RemoteStore,
    executor: &RequestExecutor,
    project_id: u64,
) -> Result<Vec<Section>> {
    let mut sections = executor
        .execute_required("get_sections", || store.list_sections(project_id))
        .await?;
    assign_root_ids(&mut sections)?;
    Ok(sections)
}

pub struct SectionReconciler {
    store: Arc<dyn RemoteStore>,
    executor: RequestExecutor,
}

impl SectionReconciler {
    pub fn new(store: Arc<dyn RemoteStore>, executor: RequestExecutor) -> Self {
        Self { store, executor }
    }

    /// Finds the parentless section called `name`, creating it when missing.
    pub async fn ensure_root_section(&self, project_id: u64, name: &str) -> Result<Section> {
        let sections = self
            .executor
            .execute_required("get_sections", || self.store.list_sections(project_id))
            .await?;

        if let Some(existing) = sections.into_iter().find(|s| s.is_root() && s.name == name) {
            debug!(section_id = ?existing.id, "Root section '{}' found", name);
            return Ok(existing);
        }

        info!("Root section named '{}' not found in TestRail.", name);
        let new_section = NewSection::new(name, None);
        self.executor
            .execute_required("add_section", || {
                self.store.create_section(project_id, &new_section)
            })
            .await
    }

    /// Current snapshot of the sections under the active root.
    pub async fn fetch_subtree(&self, context: &SyncContext) -> Result<Vec<Section>> {
        let sections =
            fetch_sections(self.store.as_ref(), &self.executor, context.project_id).await?;
        Ok(sections.into_iter().filter(|s| context.owns(s)).collect())
    }

    /// Materializes `hierarchy` under the root section, one level at a time.
    ///
    /// Each level re-reads the subtree so sections created by the previous
    /// level are visible. Existing `(name, parent)` pairs are reused.
    pub async fn reconcile(
        &self,
        context: &SyncContext,
        hierarchy: &SectionHierarchy,
    ) -> Result<SectionMap> {
        info!("Processing sections...");

        let mut map = SectionMap::default();
        let mut resolved: Vec<Vec<Section>> = Vec::with_capacity(hierarchy.max_depth());

        for (level, prefixes) in hierarchy.levels().iter().enumerate() {
            info!(level, "Sections level {}", level);
            let snapshot = self.fetch_subtree(context).await?;
            let mut materialized = Vec::with_capacity(prefixes.len());

            for prefix in prefixes {
                let segments: Vec<&str> = prefix.split('.').collect();
                let (name, ancestors) = segments
                    .split_last()
                    .ok_or_else(|| AppError::Consistency("Empty section path".to_string()))?;

                let mut parent_id = context.root_section_id;
                for (depth, segment) in ancestors.iter().enumerate() {
                    parent_id = resolved
                        .get(depth)
                        .and_then(|sections| {
                            sections
                                .iter()
                                .find(|s| s.name == *segment && s.parent_id == Some(parent_id))
                        })
                        .and_then(|s| s.id)
                        .ok_or_else(|| {
                            AppError::Consistency(format!(
                                "Parent section '{}' of '{}' was not materialized at level {}",
                                segment, prefix, depth
                            ))
                        })?;
                }

                let existing = snapshot
                    .iter()
                    .find(|s| s.name == *name && s.parent_id == Some(parent_id));

                let mut section = match existing {
                    Some(section) => {
                        info!("Section {} exists.", name);
                        map.reused += 1;
                        section.clone()
                    }
                    None => {
                        info!("Creating section: {}", name);
                        let new_section = NewSection::new(name, Some(parent_id));
                        let created = self
                            .executor
                            .execute_required("add_section", || {
                                self.store.create_section(context.project_id, &new_section)
                            })
                            .await?;
                        map.created += 1;
                        created
                    }
                };
                section.root_section_id = Some(context.root_section_id);

                let id = section.id.ok_or_else(|| {
                    AppError::Consistency(format!("Section '{}' came back without an id", name))
                })?;
                map.ids_by_path.insert(prefix.clone(), id);
                materialized.push(section);
            }

            resolved.push(materialized);
        }

        info!(
            created = map.created,
            reused = map.reused,
            "Processing sections complete."
        );
        Ok(map)
    }
}
