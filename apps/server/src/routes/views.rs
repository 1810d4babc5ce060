// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Views table endpoint.

use axum::{extract::State, Json};
use bim_dash_client::views_tree;
use bim_dash_core::GroupTree;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ViewsTreeResponse {
    /// project → discipline → file → version → entries with their views.
    pub tree: GroupTree,
    pub versions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// GET /api/v1/views/tree
pub async fn tree(State(state): State<AppState>) -> Result<Json<ViewsTreeResponse>, ApiError> {
    let (entries, notice) = match state.backend.views_table().await {
        Ok(entries) => (entries, None),
        Err(e) => {
            tracing::warn!(error = %e, "Views table unavailable");
            (Vec::new(), Some(e.notice()))
        }
    };

    let tree = views_tree(&entries)?;
    Ok(Json(ViewsTreeResponse {
        tree,
        versions: entries.len(),
        notice,
    }))
}
