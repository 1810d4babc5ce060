// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The project-data backend seam.

use async_trait::async_trait;
use bim_dash_core::{
    ChatAnswer, Designer, DesignerDraft, Element, ProjectCoordinate, ProjectFileVersion,
    ViewSummary, ViewsTableEntry,
};

use crate::error::Result;

/// Endpoints the dashboard consumes. Every call returns full lists; there is
/// no paging or streaming.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Project identifiers.
    async fn list_projects(&self) -> Result<Vec<String>>;

    /// Model file names of a project.
    async fn list_files(&self, project: &str) -> Result<Vec<String>>;

    /// 3D views of every version of a file.
    async fn list_views_3d(&self, project: &str, file_name: &str) -> Result<Vec<ViewSummary>>;

    /// Elements visible in one view of one file version.
    async fn list_elements(
        &self,
        project: &str,
        file_name: &str,
        version: i64,
        view_name: &str,
    ) -> Result<Vec<Element>>;

    /// Placement of every project.
    async fn list_coordinates(&self) -> Result<Vec<ProjectCoordinate>>;

    /// Every published file version across projects.
    async fn projects_table(&self) -> Result<Vec<ProjectFileVersion>>;

    /// Views of every file version across projects.
    async fn views_table(&self) -> Result<Vec<ViewsTableEntry>>;

    async fn list_designers(&self, project: &str) -> Result<Vec<Designer>>;

    async fn create_designer(&self, draft: &DesignerDraft) -> Result<()>;

    async fn update_designer(&self, project: &str, id: i64, draft: &DesignerDraft) -> Result<()>;

    async fn delete_designer(&self, project: &str, id: i64) -> Result<()>;

    /// Forwards a free-text question to the assistant.
    async fn ask(&self, question: &str) -> Result<ChatAnswer>;
}
