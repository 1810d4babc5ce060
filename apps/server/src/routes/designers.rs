// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Designer directory endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bim_dash_core::{
    Designer, DesignerDiscipline, DesignerDraft, DesignerFilter, DesignerFilterOptions,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DesignersResponse {
    pub project: String,
    /// Designers passing the filters.
    pub designers: Vec<Designer>,
    /// Designers before filtering.
    pub total: usize,
    /// Selector options, from the unfiltered list.
    pub options: DesignerFilterOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Create/update body. A discipline of "Other" takes its value from
/// `custom_discipline`.
#[derive(Debug, Deserialize)]
pub struct DesignerForm {
    #[serde(flatten)]
    pub draft: DesignerDraft,
    #[serde(default)]
    pub custom_discipline: String,
}

impl DesignerForm {
    /// The draft to send for `project`, or the fields that failed.
    fn into_draft(self, project: &str) -> Result<DesignerDraft, ApiError> {
        let discipline =
            DesignerDiscipline::resolve(&self.draft.discipline, &self.custom_discipline);
        let draft = DesignerDraft {
            project_name: project.to_string(),
            discipline,
            ..self.draft
        }
        .normalized();
        draft.validate()?;
        Ok(draft)
    }
}

/// GET /api/v1/projects/:project/designers
pub async fn list(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(filter): Query<DesignerFilter>,
) -> Json<DesignersResponse> {
    let (all, notice) = match state.backend.list_designers(&project).await {
        Ok(designers) => (designers, None),
        Err(e) => {
            tracing::warn!(project = %project, error = %e, "Designers unavailable");
            (Vec::new(), Some(e.notice()))
        }
    };

    Json(DesignersResponse {
        designers: filter.apply(&all),
        total: all.len(),
        options: DesignerFilterOptions::from_designers(&all),
        project,
        notice,
    })
}

/// POST /api/v1/projects/:project/designers
pub async fn create(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Json(form): Json<DesignerForm>,
) -> Result<(StatusCode, Json<DesignerDraft>), ApiError> {
    let draft = form.into_draft(&project)?;
    state.backend.create_designer(&draft).await?;
    tracing::info!(project = %project, "Designer added");
    Ok((StatusCode::CREATED, Json(draft)))
}

/// PUT /api/v1/projects/:project/designers/:id
pub async fn update(
    State(state): State<AppState>,
    Path((project, id)): Path<(String, i64)>,
    Json(form): Json<DesignerForm>,
) -> Result<Json<DesignerDraft>, ApiError> {
    let draft = form.into_draft(&project)?;
    state.backend.update_designer(&project, id, &draft).await?;
    tracing::info!(project = %project, id, "Designer updated");
    Ok(Json(draft))
}

/// DELETE /api/v1/projects/:project/designers/:id
pub async fn remove(
    State(state): State<AppState>,
    Path((project, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    state.backend.delete_designer(&project, id).await?;
    tracing::info!(project = %project, id, "Designer removed");
    Ok(StatusCode::NO_CONTENT)
}
