// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projects table endpoint.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use bim_dash_client::ProjectsOverview;
use bim_dash_core::GroupTree;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// Published file versions grouped by project and discipline.
#[derive(Debug, Serialize)]
pub struct ProjectsTableResponse {
    /// project → discipline → rows.
    pub projects: GroupTree,
    /// Sorted disciplines of each project, for the discipline selector.
    pub disciplines: BTreeMap<String, Vec<String>>,
    /// Set when the backend could not be read; the table is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// GET /api/v1/projects/table
pub async fn table(State(state): State<AppState>) -> Result<Json<ProjectsTableResponse>, ApiError> {
    let overview = ProjectsOverview::load(state.backend.as_ref()).await?;

    Ok(Json(ProjectsTableResponse {
        projects: overview.tree().clone(),
        disciplines: overview
            .disciplines_by_project()
            .iter()
            .map(|(project, disciplines)| (project.clone(), disciplines.clone()))
            .collect(),
        notice: overview.notice().map(str::to_string),
    }))
}
