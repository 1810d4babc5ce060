// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grouped project tables.

use bim_dash_core::{
    build_group_tree, distinct_values_by, sorted, to_records, GroupKey, GroupTree, KeyPart,
    ProjectFileVersion, Record, RecordKind, SelectionChain, ViewsTableEntry, NO_DISCIPLINE,
};
use rustc_hash::FxHashMap;

use crate::backend::Backend;
use crate::error::Result;

/// Nesting of the projects table: project, then the discipline token of the
/// file name.
pub fn projects_key() -> bim_dash_core::Result<GroupKey> {
    GroupKey::new(vec![KeyPart::field("project"), KeyPart::discipline()])
}

/// Nesting of the views table: project, discipline, file, version.
pub fn views_key() -> bim_dash_core::Result<GroupKey> {
    GroupKey::new(vec![
        KeyPart::field("project"),
        KeyPart::field("discipline").with_fallback(NO_DISCIPLINE),
        KeyPart::field("file_name"),
        KeyPart::field("version_number"),
    ])
}

/// Groups views-table entries by [`views_key`]. Each leaf holds the entries
/// (with their views) of one file version.
pub fn views_tree(entries: &[ViewsTableEntry]) -> bim_dash_core::Result<GroupTree> {
    Ok(build_group_tree(&to_records(entries)?, &views_key()?))
}

/// The projects table with its expand/select state.
///
/// Expansion is a two-level chain: opening a project offers its disciplines,
/// choosing a discipline shows that discipline's rows.
#[derive(Debug, Clone)]
pub struct ProjectsOverview {
    tree: GroupTree,
    disciplines: FxHashMap<String, Vec<String>>,
    expansion: SelectionChain,
    notice: Option<String>,
}

impl ProjectsOverview {
    pub fn from_rows(rows: &[ProjectFileVersion]) -> Result<Self> {
        let records = to_records(rows)?;
        let key = projects_key()?;
        let tree = build_group_tree(&records, &key);
        let disciplines = distinct_values_by(&records, &key.parts()[0], &key.parts()[1])
            .into_iter()
            .map(|(project, set)| (project, sorted(set)))
            .collect();

        Ok(Self {
            tree,
            disciplines,
            expansion: SelectionChain::new(&["project", "discipline"])?,
            notice: None,
        })
    }

    /// Fetches the projects table. A backend failure yields an empty table
    /// with a notice.
    pub async fn load(backend: &dyn Backend) -> Result<Self> {
        match backend.projects_table().await {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "Loaded projects table");
                Self::from_rows(&rows)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Projects table unavailable");
                let mut overview = Self::from_rows(&[])?;
                overview.notice = Some(e.notice());
                Ok(overview)
            }
        }
    }

    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    /// Projects in first-seen order.
    pub fn projects(&self) -> Vec<&str> {
        self.tree
            .as_branch()
            .map(|branch| branch.keys().collect())
            .unwrap_or_default()
    }

    /// Sorted disciplines of `project`.
    pub fn disciplines(&self, project: &str) -> &[String] {
        self.disciplines
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn disciplines_by_project(&self) -> &FxHashMap<String, Vec<String>> {
        &self.disciplines
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn expanded_project(&self) -> Option<&str> {
        self.expansion.selected(0)
    }

    pub fn selected_discipline(&self) -> Option<&str> {
        self.expansion.selected(1)
    }

    /// Expands `project`, or collapses it if it is already expanded.
    pub fn toggle_project(&mut self, project: &str) -> Result<()> {
        if self.expanded_project() == Some(project) {
            self.expansion.clear(0)?;
            return Ok(());
        }
        if let Some(ticket) = self.expansion.select(0, project)? {
            let options = self
                .disciplines(project)
                .iter()
                .map(|discipline| {
                    Record::new(RecordKind::Project)
                        .with("project", project)
                        .with("discipline", discipline.as_str())
                })
                .collect();
            self.expansion.complete(&ticket, Ok(options));
        }
        Ok(())
    }

    /// Shows the rows of `discipline` within the expanded project.
    pub fn select_discipline(&mut self, discipline: &str) -> Result<()> {
        if let Some(ticket) = self.expansion.select(1, discipline)? {
            let rows = self
                .tree
                .get(&[ticket.prefix[0].as_str(), discipline])
                .and_then(GroupTree::as_leaf)
                .map(<[Record]>::to_vec)
                .unwrap_or_default();
            self.expansion.complete(&ticket, Ok(rows));
        }
        Ok(())
    }

    /// Rows of the selected project and discipline.
    pub fn visible_rows(&self) -> &[Record] {
        self.expansion.detail()
    }
}
