use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// A node of the remote section tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub id: Option<u64>,
    pub name: String,
    pub description: String,
    pub depth: Option<u32>,
    pub parent_id: Option<u64>,
    /// Id of the depth-0 ancestor. Never sent to the store.
    pub root_section_id: Option<u64>,
}

/// Request body for `add_section`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSection {
    pub name: String,
    pub description: String,
    pub parent_id: Option<u64>,
}

impl NewSection {
    /// Sections are created with an empty description.
    pub fn new(name: &str, parent_id: Option<u64>) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            parent_id,
        }
    }
}

impl Section {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none() || self.depth == Some(0)
    }

    /// Walks `parent_id` links up to the depth-0 ancestor.
    ///
    /// The walk is bounded by the deepest depth in `sections` plus one, so a
    /// cyclic or self-referencing chain is reported instead of looping.
    pub fn root_section<'a>(&'a self, sections: &'a [Section]) -> Result<&'a Section> {
        let max_depth = sections
            .iter()
            .filter_map(|s| s.depth)
            .max()
            .unwrap_or(0)
            .max(self.depth.unwrap_or(0))
            + 1;

        let mut current = self;
        let mut iterations = 0;
        while !current.is_root() && iterations < max_depth {
            let parent_id = current.parent_id;
            current = sections
                .iter()
                .find(|s| s.id.is_some() && s.id == parent_id)
                .ok_or_else(|| {
                    AppError::Consistency(format!(
                        "Section '{}' (id {:?}) references missing parent id {:?}",
                        current.name, current.id, parent_id
                    ))
                })?;
            iterations += 1;
        }

        if !current.is_root() {
            return Err(AppError::Consistency(format!(
                "Section '{}' (id {:?}) does not reach a root section within {} steps",
                self.name, self.id, max_depth
            )));
        }

        Ok(current)
    }
}

/// Fills `root_section_id` on every section of a freshly fetched snapshot.
pub fn assign_root_ids(sections: &mut [Section]) -> Result<()> {
    let roots = sections
        .iter()
        .map(|section| section.root_section(sections).map(|root| root.id))
        .collect::<Result<Vec<_>>>()?;

    for (section, root_id) in sections.iter_mut().zip(roots) {
        section.root_section_id = root_id;
    }
    Ok(())
}
