// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The designer directory: projects from the map, designers per project.

use std::sync::Arc;

use bim_dash_core::{Designer, DesignerDraft, DesignerFilter, DesignerFilterOptions};

use crate::backend::Backend;
use crate::cascade::Cascade;
use crate::error::{ClientError, Result};

/// Designer list of the selected project, with filters and edits.
pub struct DesignerDirectory {
    cascade: Cascade,
    filter: DesignerFilter,
}

impl DesignerDirectory {
    pub fn new(backend: Arc<dyn Backend>) -> Result<Self> {
        Ok(Self {
            cascade: Cascade::designer_directory(backend)?,
            filter: DesignerFilter::default(),
        })
    }

    /// Loads the project list.
    pub fn start(&mut self) {
        self.cascade.start();
    }

    /// Opens `project`, e.g. from a map marker. Filters are kept.
    pub fn open_project(&mut self, project: &str) -> Result<()> {
        self.cascade.select(0, project)
    }

    pub fn project(&self) -> Option<&str> {
        self.cascade.chain().selected(0)
    }

    /// Projects known from the coordinates list.
    pub fn projects(&self) -> Vec<String> {
        self.cascade.option_labels(0)
    }

    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    pub fn cascade_mut(&mut self) -> &mut Cascade {
        &mut self.cascade
    }

    /// Waits for outstanding fetches.
    pub async fn settle(&mut self) {
        self.cascade.settle().await;
    }

    /// Every designer of the selected project.
    pub fn designers(&self) -> Vec<Designer> {
        self.cascade
            .chain()
            .detail()
            .iter()
            .filter_map(|record| match record.decode::<Designer>() {
                Ok(designer) => Some(designer),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed designer record");
                    None
                }
            })
            .collect()
    }

    /// Designers passing the current filter.
    pub fn visible(&self) -> Vec<Designer> {
        self.filter.apply(&self.designers())
    }

    pub fn filter(&self) -> &DesignerFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: DesignerFilter) {
        self.filter = filter;
    }

    pub fn reset_filters(&mut self) {
        self.filter = DesignerFilter::default();
    }

    /// Options for the three filter selectors, from the unfiltered list.
    pub fn filter_options(&self) -> DesignerFilterOptions {
        DesignerFilterOptions::from_designers(&self.designers())
    }

    /// Validates and saves a designer for the selected project.
    ///
    /// `id` of `None` creates a new designer. An invalid draft is rejected
    /// before any request is made. On success the designer list is
    /// re-fetched.
    pub async fn save(&mut self, draft: &DesignerDraft, id: Option<i64>) -> Result<()> {
        let project = self.project().ok_or(ClientError::NoProject)?.to_string();
        let draft = DesignerDraft {
            project_name: project.clone(),
            ..draft.normalized()
        };
        draft.validate()?;

        let backend = Arc::clone(self.cascade.backend());
        match id {
            Some(id) => backend.update_designer(&project, id, &draft).await?,
            None => backend.create_designer(&draft).await?,
        }
        self.cascade.refresh_detail()
    }

    /// Deletes a designer of the selected project and re-fetches the list.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        let project = self.project().ok_or(ClientError::NoProject)?.to_string();
        let backend = Arc::clone(self.cascade.backend());
        backend.delete_designer(&project, id).await?;
        self.cascade.refresh_detail()
    }
}
