// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map endpoint.

use axum::{extract::State, Json};
use bim_dash_client::{load_map_points, MapPoint};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MapPointsResponse {
    pub points: Vec<MapPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// GET /api/v1/map/points
pub async fn points(State(state): State<AppState>) -> Json<MapPointsResponse> {
    match load_map_points(state.backend.as_ref(), &state.geocoder).await {
        Ok(points) => Json(MapPointsResponse {
            points,
            notice: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Project coordinates unavailable");
            Json(MapPointsResponse {
                points: Vec::new(),
                notice: Some(e.notice()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get_json, stub_app, StubBackend};
    use bim_dash_client::UNKNOWN_CITY;

    #[tokio::test]
    async fn points_carry_city_names() {
        // The test geocoder is unreachable, so every city is unknown.
        let app = stub_app(StubBackend::sample());
        let (_, body) = get_json(&app, "/api/v1/map/points").await;

        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["project"], "Tower");
        assert_eq!(points[0]["city"], UNKNOWN_CITY);
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_notice() {
        let app = stub_app(StubBackend::sample().failing());
        let (_, body) = get_json(&app, "/api/v1/map/points").await;
        assert_eq!(body["points"], serde_json::json!([]));
        assert!(body["notice"].is_string());
    }
}
