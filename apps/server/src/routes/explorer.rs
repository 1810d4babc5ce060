// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Explorer session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::{SessionKind, SessionView};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSession {
    #[serde(default)]
    pub kind: SessionKind,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Level name, e.g. `project` or `version`.
    pub level: String,
    /// Value to select; empty clears the level.
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub slot: usize,
}

/// POST /api/v1/explorer/sessions
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSession>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let view = state.sessions.create(body.kind).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/explorer/sessions/:id
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// DELETE /api/v1/explorer/sessions/:id
pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/explorer/sessions/:id/select
pub async fn select(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.select(id, &body.level, &body.value).await?))
}

/// POST /api/v1/explorer/sessions/:id/reset
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.reset(id).await?))
}

/// POST /api/v1/explorer/sessions/:id/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.refresh(id, body.slot).await?))
}
