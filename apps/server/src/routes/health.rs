// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub explorer_sessions: usize,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const fn endpoint(
    method: &'static str,
    path: &'static str,
    description: &'static str,
) -> EndpointInfo {
    EndpointInfo {
        method,
        path,
        description,
    }
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "bim-dash-server",
        explorer_sessions: state.sessions.len().await,
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "bim-dash-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Project data, views and designers for the BIM dashboard",
        endpoints: vec![
            endpoint("GET", "/api/v1/health", "Health check endpoint"),
            endpoint(
                "GET",
                "/api/v1/projects/table",
                "File versions grouped by project and discipline",
            ),
            endpoint(
                "GET",
                "/api/v1/views/tree",
                "Views grouped by project, discipline, file and version",
            ),
            endpoint("GET", "/api/v1/map/points", "Project locations with city names"),
            endpoint(
                "GET",
                "/api/v1/projects/:project/designers",
                "Designers of a project, filterable",
            ),
            endpoint("POST", "/api/v1/projects/:project/designers", "Add a designer"),
            endpoint("PUT", "/api/v1/projects/:project/designers/:id", "Update a designer"),
            endpoint("DELETE", "/api/v1/projects/:project/designers/:id", "Remove a designer"),
            endpoint("GET", "/api/v1/notes", "Ideas notebook"),
            endpoint("GET", "/api/v1/notes/export", "Ideas notebook as plain text"),
            endpoint("PUT", "/api/v1/notes/:section", "Replace one notebook section"),
            endpoint("POST", "/api/v1/chat", "Ask the assistant"),
            endpoint("POST", "/api/v1/explorer/sessions", "Open a cascading explorer session"),
            endpoint("GET", "/api/v1/explorer/sessions/:id", "Current explorer session state"),
            endpoint("DELETE", "/api/v1/explorer/sessions/:id", "Close an explorer session"),
            endpoint("POST", "/api/v1/explorer/sessions/:id/select", "Change a selection"),
            endpoint("POST", "/api/v1/explorer/sessions/:id/reset", "Clear every selection"),
            endpoint("POST", "/api/v1/explorer/sessions/:id/refresh", "Re-fetch one slot"),
        ],
    })
}
