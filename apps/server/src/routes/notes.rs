// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ideas notebook endpoints.

use std::sync::PoisonError;

use axum::{
    extract::{Path, State},
    Json,
};
use bim_dash_core::{IdeasNotebook, NoteSection};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SectionUpdate {
    pub text: String,
}

/// GET /api/v1/notes
pub async fn get_notes(State(state): State<AppState>) -> Json<IdeasNotebook> {
    let store = state.notes.lock().unwrap_or_else(PoisonError::into_inner);
    Json(IdeasNotebook::load(&**store))
}

/// GET /api/v1/notes/export - Plain-text copy of the notebook.
pub async fn export(State(state): State<AppState>) -> String {
    let store = state.notes.lock().unwrap_or_else(PoisonError::into_inner);
    IdeasNotebook::load(&**store).render_text()
}

/// PUT /api/v1/notes/:section
pub async fn update_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(update): Json<SectionUpdate>,
) -> Result<Json<IdeasNotebook>, ApiError> {
    let section = NoteSection::parse(&section)
        .ok_or_else(|| ApiError::NotFound(format!("notes section {section:?}")))?;

    let mut store = state.notes.lock().unwrap_or_else(PoisonError::into_inner);
    let mut notebook = IdeasNotebook::load(&**store);
    notebook.edit(&mut **store, section, update.text)?;
    tracing::debug!(section = section.as_str(), "Notes section saved");
    Ok(Json(notebook))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get_json, send_json, stub_app_with_notes, StubBackend};
    use axum::http::{Method, StatusCode};
    use bim_dash_core::JsonFileStore;
    use serde_json::json;

    #[tokio::test]
    async fn sections_persist_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let app = stub_app_with_notes(
            StubBackend::sample(),
            Box::new(JsonFileStore::open(&path).unwrap()),
        );

        let (status, body) = send_json(
            &app,
            Method::PUT,
            "/api/v1/notes/client_future",
            json!({"text": "Weekly model health report"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["client_future"], "Weekly model health report");

        let (_, body) = get_json(&app, "/api/v1/notes").await;
        assert_eq!(body["client_future"], "Weekly model health report");
        assert_eq!(body["technical_current"], "");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("project_ideas"));
    }

    #[tokio::test]
    async fn unknown_section_is_not_found() {
        let app = crate::test_support::stub_app(StubBackend::sample());
        let (status, _) = send_json(
            &app,
            Method::PUT,
            "/api/v1/notes/misc",
            json!({"text": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
